use serde::Serialize;

use crate::attachment;
use crate::cell::CellValue;
use crate::downloader;
use crate::error::{Error, Result};
use crate::item::{Draft, DraftPatch, Item, new_item_id};
use crate::login::UserTag;
use crate::saving::{ITEMS_KEY, Storage, USER_KEY, load_json, save_json};

/// Which overlay the page currently shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[default]
    Closed,
    Login,
}

/// The whole application state behind the page.
///
/// The item list and the user tag mirror their storage slots: every change is
/// written out before it is committed in memory, so a failed write leaves the
/// state exactly as it was.
pub struct Inventory {
    storage: Box<dyn Storage>,
    items: Vec<Item>,
    user: Option<UserTag>,
    draft: Draft,
    editing_id: Option<String>,
    search: String,
    panel: Panel,
}

/// Read-only view of the state, as rendered by the page.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub user: Option<&'a UserTag>,
    pub user_label: Option<&'a str>,
    pub search: &'a str,
    pub draft: &'a Draft,
    pub editing_id: Option<&'a str>,
    pub panel: Panel,
    pub items: Vec<&'a Item>,
    pub total: usize,
}

impl Inventory {
    /// Loads both slots from storage.
    ///
    /// A slot that holds garbage is copied to `<key>.corrupt`, logged and
    /// treated as empty rather than refusing to start. The copy is never
    /// overwritten by later saves.
    pub fn open(storage: impl Storage + 'static) -> Result<Self> {
        let mut storage: Box<dyn Storage> = Box::new(storage);

        let items = load_or_default::<Vec<Item>>(storage.as_mut(), ITEMS_KEY)?.unwrap_or_default();
        let user = load_or_default::<UserTag>(storage.as_mut(), USER_KEY)?;

        log::info!(
            "loaded {} items, user {}",
            items.len(),
            user.as_ref().map_or("<none>", |u| u.label())
        );

        Ok(Inventory {
            storage,
            items,
            user,
            draft: Draft::default(),
            editing_id: None,
            search: String::new(),
            panel: Panel::Closed,
        })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn user(&self) -> Option<&UserTag> {
        self.user.as_ref()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Saves the draft: updates the record being edited, or prepends a new
    /// one. Returns the id of the affected record.
    ///
    /// # Errors
    /// * [`Error::NotLoggedIn`] when no user tag is set
    /// * [`Error::MissingName`] when the draft has no name
    /// * storage errors; nothing is changed in that case
    pub fn submit(&mut self) -> Result<String> {
        let user = self.user.as_ref().ok_or(Error::NotLoggedIn)?;
        if !self.draft.has_name() {
            return Err(Error::MissingName);
        }
        let label = user.label().to_string();

        let mut next = self.items.clone();
        let id = match &self.editing_id {
            Some(id) => {
                if let Some(item) = next.iter_mut().find(|it| &it.id == id) {
                    item.overwrite(&self.draft, &label);
                } else {
                    log::warn!("edited item {} no longer exists, nothing updated", id);
                }
                id.clone()
            }
            None => {
                let mut item = Item::from_draft(&self.draft, &label);
                while next.iter().any(|it| it.id == item.id) {
                    item.id = new_item_id();
                }
                let id = item.id.clone();
                next.insert(0, item);
                id
            }
        };

        self.commit_items(next)?;
        log::info!("saved item {} by {}", id, label);

        self.editing_id = None;
        self.draft = Draft::default();
        Ok(id)
    }

    /// Loads a record into the draft and switches to edit mode.
    pub fn start_edit(&mut self, id: &str) -> Result<()> {
        let item = self
            .get(id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;
        self.draft = Draft::from_item(item);
        self.editing_id = Some(id.to_string());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
        self.draft = Draft::default();
    }

    pub fn update_draft(&mut self, patch: DraftPatch) {
        self.draft.apply(patch);
    }

    /// Embeds an uploaded photo into the draft. An empty upload (no file
    /// picked) leaves the draft alone.
    pub fn attach_image(&mut self, bytes: &[u8], declared_mime: Option<&str>) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.draft.image = Some(attachment::to_data_url(bytes, declared_mime)?);
        Ok(())
    }

    /// Removes the record with this id. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &str) -> Result<bool> {
        let Some(pos) = self.items.iter().position(|it| it.id == id) else {
            return Ok(false);
        };

        let mut next = self.items.clone();
        next.remove(pos);
        self.commit_items(next)?;
        log::info!("removed item {}", id);
        Ok(true)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Items whose name contains the search term, ignoring case, in list
    /// order.
    pub fn visible_items(&self) -> Vec<&Item> {
        let needle = self.search.to_lowercase();
        self.items.iter().filter(|it| it.matches(&needle)).collect()
    }

    /// Sets the user tag from the login panel and closes the panel.
    pub fn login(&mut self, name: &str, email: &str) -> Result<&UserTag> {
        let tag = UserTag::from_login(name, email)?;
        save_json(self.storage.as_mut(), USER_KEY, &tag)?;
        log::info!("user tag set to {}", tag.label());

        self.panel = Panel::Closed;
        Ok(&*self.user.insert(tag))
    }

    pub fn logout(&mut self) -> Result<()> {
        self.storage.remove_item(USER_KEY)?;
        if let Some(tag) = self.user.take() {
            log::info!("user tag {} cleared", tag.label());
        }
        Ok(())
    }

    pub fn open_login_panel(&mut self) {
        self.panel = Panel::Login;
    }

    pub fn close_login_panel(&mut self) {
        self.panel = Panel::Closed;
    }

    /// Header row plus one row per item passing the current search.
    pub fn export_table(&self) -> Vec<Vec<CellValue>> {
        downloader::export_table(self.visible_items())
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            user: self.user.as_ref(),
            user_label: self.user.as_ref().map(UserTag::label),
            search: &self.search,
            draft: &self.draft,
            editing_id: self.editing_id.as_deref(),
            panel: self.panel,
            items: self.visible_items(),
            total: self.items.len(),
        }
    }

    fn commit_items(&mut self, next: Vec<Item>) -> Result<()> {
        save_json(self.storage.as_mut(), ITEMS_KEY, &next)?;
        self.items = next;
        Ok(())
    }
}

/// Slot an undecodable value is moved aside to before starting empty.
pub fn corrupt_key(key: &str) -> String {
    format!("{key}.corrupt")
}

fn load_or_default<T: serde::de::DeserializeOwned>(
    storage: &mut dyn Storage,
    key: &str,
) -> Result<Option<T>> {
    match load_json(&*storage, key) {
        Ok(value) => Ok(value),
        Err(Error::Json(e)) => {
            let backup = corrupt_key(key);
            if let Some(raw) = storage.get_item(key)? {
                storage.set_item(&backup, &raw)?;
            }
            log::warn!(
                "slot {} is not valid JSON, kept as {} and starting empty: {}",
                key,
                backup,
                e
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
