use crate::cell::CellRef;
use crate::dict::ContentDict;
use crate::error::{Error, Result};

/// Recognized token metadata fields, every one optional.
///
/// A closed field set rather than an open string map: the contracts and
/// wallets only ever look these keys up. `social_links` is serialized as
/// a JSON array string under a single key.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub cover_image: Option<String>,
    pub social_links: Vec<String>,
}

impl Metadata {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.cover_image.is_none()
            && self.social_links.is_empty()
    }

    /// Builds the on-chain content dictionary cell for the present fields.
    /// Empty metadata yields an empty dictionary, which is valid.
    pub fn to_cell(&self) -> Result<CellRef> {
        let mut dict = ContentDict::new();
        let fields = [
            ("name", &self.name),
            ("description", &self.description),
            ("image", &self.image),
            ("cover_image", &self.cover_image),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                dict.put_str(key, value)?;
            }
        }
        if !self.social_links.is_empty() {
            let json = serde_json::to_string(&self.social_links)
                .map_err(|e| Error::InvalidKey(format!("social_links: {e}")))?;
            dict.put_str("social_links", &json)?;
        }
        dict.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::{self, ContentDict};

    #[test]
    fn present_fields_become_entries() {
        let meta = Metadata {
            name: Some("TonCAST Stake NFTs".into()),
            description: Some("Proof-of-stake NFTs".into()),
            image: Some("https://example.org/c.png".into()),
            ..Default::default()
        };
        let cell = meta.to_cell().unwrap();
        let keys = dict::keys(&cell).unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&ContentDict::key_hash("name")));
        assert!(!keys.contains(&ContentDict::key_hash("cover_image")));
    }

    #[test]
    fn social_links_serialize_as_one_json_entry() {
        let meta = Metadata {
            social_links: vec!["https://test.toncast.me/".into()],
            ..Default::default()
        };
        let cell = meta.to_cell().unwrap();
        let keys = dict::keys(&cell).unwrap();
        assert_eq!(keys, vec![ContentDict::key_hash("social_links")]);
    }

    #[test]
    fn empty_metadata_is_an_empty_dict() {
        let meta = Metadata::default();
        assert!(meta.is_empty());
        let cell = meta.to_cell().unwrap();
        assert!(dict::keys(&cell).unwrap().is_empty());
    }
}
