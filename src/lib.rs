/*!
# Vattu

Construction-site material inventory: a single page where site staff record
materials (name, quantity, unit, location, date, notes, photo), search them,
and export the filtered list to a spreadsheet.

## Overview

Everything is local. The item list and the current user tag are two JSON
documents kept in key-value slots on disk; "login" is just a display name or
email stamped on saved records, with no password and no access control.

## Architecture

### Frontend
- One HTML page (embedded in the binary) that renders a state snapshot and
  forwards every user action to the JSON API.

### Backend
- **Inventory** - the single application-state object: item list, user tag,
  form draft, edit mode, search term and login panel visibility
- **Saving** - key-value slot storage, written on every change
- **Downloader** - export table, XLSX and CSV writers
- **App** - axum routing over the shared inventory

## Modules

- **item**: `Item` record, form `Draft`, date and id helpers
- **login**: `UserTag` and the login rules
- **saving**: storage slots (`FileStorage`, `MemoryStorage`)
- **inventory**: state-update operations
- **attachment**: photo uploads as inline data URLs
- **cell**: scalar spreadsheet cell
- **downloader**: export (XLSX, CSV)
- **error**: error enum shown to the user as alert text
- **config**, **app**: web server (feature `web`)

## REST API Endpoints

- `GET /api/state` - current snapshot
- `PUT /api/search`, `PUT /api/draft` - search term, form fields
- `POST /api/draft/image` - attach a photo to the draft
- `POST /api/submit`, `POST /api/cancel` - save or abandon the draft
- `POST /api/items/{id}/edit`, `DELETE /api/items/{id}` - edit, delete
- `POST /api/login`, `POST /api/logout` - set or clear the user tag
- `GET /api/export?format=xlsx|csv` - download the filtered list
*/

pub mod attachment;
pub mod cell;
pub mod downloader;
pub mod error;
pub mod inventory;
pub mod item;
pub mod login;
pub mod saving;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;

pub use cell::CellValue;
pub use error::{Error, Result};
pub use inventory::{Inventory, Panel, Snapshot};
pub use item::{Draft, DraftPatch, Item};
pub use login::UserTag;
pub use saving::{FileStorage, MemoryStorage, Storage};
