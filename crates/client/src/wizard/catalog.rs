use api_types::{contact::ContactList, template::TemplateView};

/// Segments offered when the backend does not expose `/contacts/lists`.
pub fn default_audiences() -> Vec<ContactList> {
    [
        ("all", "All Subscribers", 12_450, "Master List"),
        ("segment_vip", "VIP Customers", 850, "Segment"),
        ("segment_active", "Active Last 30 Days", 3_200, "Segment"),
    ]
    .into_iter()
    .map(|(id, name, count, kind)| ContactList {
        id: id.to_string(),
        name: name.to_string(),
        count,
        kind: kind.to_string(),
    })
    .collect()
}

pub trait Named {
    fn name(&self) -> &str;
}

impl Named for ContactList {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TemplateView {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Case-insensitive substring search on the item names. A blank query keeps
/// everything.
pub fn filter_by_name<'a, T: Named>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let query = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| query.is_empty() || item.name().to_lowercase().contains(&query))
        .collect()
}
