use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// One inventory record: a material on site.
///
/// Field names match the persisted JSON layout, so the stored list can be
/// read back by older copies of the page as well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque identifier, unique within the list
    pub id: String,

    /// Material name, the only field the search looks at
    pub name: String,

    /// Quantity on hand, never negative
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: f64,

    /// Unit label ("Bao", "cây", ...)
    #[serde(default)]
    pub unit: String,

    /// Where on site the material is kept
    #[serde(default)]
    pub location: String,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,

    /// Inline `data:` URL of the photo, if one was attached
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,

    /// Entry date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,

    /// Display label of whoever last saved the record
    #[serde(default)]
    pub user: String,
}

/// Transient form buffer for create and edit.
///
/// Every field is kept as the text the user typed; coercion happens once, in
/// [`Draft::quantity_value`], when the draft is saved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub location: String,
    pub date: String,
    pub notes: String,
    pub image: Option<String>,
}

/// Partial update of the draft's text fields, as sent by the page on input.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DraftPatch {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl Default for Draft {
    fn default() -> Self {
        Draft {
            name: String::new(),
            quantity: String::new(),
            unit: String::new(),
            location: String::new(),
            date: iso_today(),
            notes: String::new(),
            image: None,
        }
    }
}

impl Draft {
    /// Loads an existing record into the form for editing.
    pub fn from_item(item: &Item) -> Self {
        Draft {
            name: item.name.clone(),
            quantity: item.quantity.to_string(),
            unit: item.unit.clone(),
            location: item.location.clone(),
            date: if item.date.is_empty() {
                iso_today()
            } else {
                item.date.clone()
            },
            notes: item.notes.clone(),
            image: item.image.clone(),
        }
    }

    pub fn apply(&mut self, patch: DraftPatch) {
        let DraftPatch {
            name,
            quantity,
            unit,
            location,
            date,
            notes,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(quantity) = quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = unit {
            self.unit = unit;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(date) = date {
            self.date = date;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Quantity as saved: blank, unparsable, non-finite and negative input
    /// all become zero.
    pub fn quantity_value(&self) -> f64 {
        non_negative(self.quantity.trim().parse::<f64>().ok())
    }

    /// Entry date as saved: today when the field was cleared.
    pub fn date_value(&self) -> String {
        let date = self.date.trim();
        if date.is_empty() {
            iso_today()
        } else {
            date.to_string()
        }
    }
}

impl Item {
    /// Builds a brand new record from a draft under a freshly minted id.
    pub fn from_draft(draft: &Draft, user: &str) -> Self {
        let mut item = Item {
            id: new_item_id(),
            name: String::new(),
            quantity: 0.0,
            unit: String::new(),
            location: String::new(),
            notes: String::new(),
            image: None,
            date: String::new(),
            user: String::new(),
        };
        item.overwrite(draft, user);
        item
    }

    /// Replaces every editable field with the draft's, keeping the id.
    pub fn overwrite(&mut self, draft: &Draft, user: &str) {
        self.name = draft.name.clone();
        self.quantity = draft.quantity_value();
        self.unit = draft.unit.clone();
        self.location = draft.location.clone();
        self.notes = draft.notes.clone();
        self.image = draft.image.clone();
        self.date = draft.date_value();
        self.user = user.to_string();
    }

    /// Case-insensitive substring match on the name only.
    pub fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty() || self.name.to_lowercase().contains(needle_lower)
    }
}

/// Mints an identifier for a new record.
pub fn new_item_id() -> String {
    format!("local_{}", Uuid::new_v4().simple())
}

/// Today's UTC date as `YYYY-MM-DD`.
pub fn iso_today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn non_negative(quantity: Option<f64>) -> f64 {
    match quantity {
        Some(q) if q.is_finite() && q > 0.0 => q,
        _ => 0.0,
    }
}

/// Stored quantities may be `null` (the page wrote `Infinity` that way) or a
/// numeric string; both load instead of failing the whole list.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let quantity = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(non_negative(quantity))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
