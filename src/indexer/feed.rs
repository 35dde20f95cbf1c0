use crate::core::error::IndexerError;
use crate::models::candidate::Candidate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const MAGNET_ATTR_NAMES: [&str; 3] = ["magneturl", "magneturi", "magnet"];

/// One `<item>` of a Torznab RSS response, before filtering
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub size: Option<String>,
    pub enclosure_url: Option<String>,
    pub enclosure_length: Option<String>,
    /// `torznab:attr` name/value pairs, names lowercased
    pub attrs: Vec<(String, String)>,
}

#[derive(Clone, Copy)]
enum TextField {
    Title,
    Link,
    Guid,
    Size,
}

impl FeedItem {
    /// Value of the last attr with one of `names`; later repeats override
    fn attr(&self, names: &[&str]) -> Option<&str> {
        self.attrs
            .iter()
            .rev()
            .find(|(name, _)| names.contains(&name.as_str()))
            .map(|(_, value)| value.as_str())
    }

    fn text_slot(&mut self, field: TextField) -> &mut String {
        let slot = match field {
            TextField::Title => return &mut self.title,
            TextField::Link => &mut self.link,
            TextField::Guid => &mut self.guid,
            TextField::Size => &mut self.size,
        };
        slot.get_or_insert_with(String::new)
    }

    /// First magnet URI among enclosure url, link, guid and magnet attrs
    pub fn magnet(&self) -> Option<String> {
        let from_attrs = self
            .attrs
            .iter()
            .filter(|(name, _)| MAGNET_ATTR_NAMES.contains(&name.as_str()))
            .map(|(_, value)| value.as_str());

        [
            self.enclosure_url.as_deref(),
            self.link.as_deref(),
            self.guid.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(from_attrs)
        .map(str::trim)
        .find(|value| is_magnet(value))
        .map(str::to_string)
    }

    pub fn seeders(&self) -> Option<u64> {
        self.attr(&["seeders"]).and_then(safe_int)
    }

    pub fn leechers(&self) -> Option<u64> {
        self.attr(&["leechers", "peers"]).and_then(safe_int)
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.attr(&["size"])
            .and_then(safe_int)
            .or_else(|| self.size.as_deref().and_then(safe_int))
            .or_else(|| self.enclosure_length.as_deref().and_then(safe_int))
    }

    /// Convert into a candidate, `None` when the item carries no magnet
    pub fn into_candidate(self) -> Option<Candidate> {
        let magnet = self.magnet()?;
        let title = self.title.trim();

        let mut candidate = Candidate::new(magnet)
            .with_counts(self.seeders(), self.leechers())
            .with_size(self.size_bytes());
        if !title.is_empty() {
            candidate = candidate.with_title(title);
        }
        Some(candidate)
    }
}

fn is_magnet(value: &str) -> bool {
    value
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("magnet:"))
}

/// Parse an integer count, tolerating thousands separators
pub fn safe_int(raw: &str) -> Option<u64> {
    raw.trim().replace(',', "").parse().ok()
}

/// True when every query token of three or more characters appears in the title
pub fn title_matches(query: &str, title: &str) -> bool {
    let normalized = title.to_lowercase();
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 3)
        .all(|token| normalized.contains(token))
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn read_item_element(item: &mut FeedItem, element: &BytesStart<'_>) -> Option<TextField> {
    match element.local_name().as_ref() {
        b"title" => Some(TextField::Title),
        b"link" => Some(TextField::Link),
        b"guid" => Some(TextField::Guid),
        b"size" => Some(TextField::Size),
        b"enclosure" => {
            item.enclosure_url = attribute(element, "url");
            item.enclosure_length = attribute(element, "length");
            None
        }
        b"attr" => {
            if let Some(name) = attribute(element, "name") {
                let value = attribute(element, "value").unwrap_or_default();
                item.attrs.push((name.to_lowercase(), value));
            }
            None
        }
        _ => None,
    }
}

/// Parse every `<item>` of an RSS/Torznab document
pub fn parse_items(xml: &str) -> Result<Vec<FeedItem>, IndexerError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut field: Option<TextField> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            IndexerError::Xml(format!("{e} at position {}", reader.error_position()))
        })?;

        match event {
            Event::Start(ref element) if element.local_name().as_ref() == b"item" => {
                current = Some(FeedItem::default());
                field = None;
            }
            Event::Start(ref element) => {
                if let Some(item) = current.as_mut() {
                    field = read_item_element(item, element);
                }
            }
            Event::Empty(ref element) => {
                if let Some(item) = current.as_mut() {
                    read_item_element(item, element);
                }
            }
            Event::Text(text) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field) {
                    let text = text
                        .unescape()
                        .map_err(|e| IndexerError::Xml(e.to_string()))?;
                    item.text_slot(field).push_str(&text);
                }
            }
            Event::CData(data) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field) {
                    let data = data.into_inner();
                    item.text_slot(field).push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(ref element) if element.local_name().as_ref() == b"item" => {
                if let Some(item) = current.take() {
                    items.push(item);
                }
                field = None;
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

/// Items that pass the title filter and carry a magnet, in feed order
pub fn filter_candidates(items: Vec<FeedItem>, query: &str) -> Vec<Candidate> {
    items
        .into_iter()
        .filter(|item| {
            let title = item.title.trim();
            title.is_empty() || title_matches(query, title)
        })
        .filter_map(FeedItem::into_candidate)
        .collect()
}
