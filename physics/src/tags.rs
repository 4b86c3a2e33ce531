use hashbrown::HashMap;
use kernel::settings::MAX_TAGS;
use kernel::{BitmaskFlags, TagBit};

use crate::error::{PhysicsError, PhysicsResult};

/// Index of a registered tag.
pub type TagIndex = u8;

/// Tag names of a world and the symmetric collision mask between them.
///
/// Row `i` bit `j` is set when tag `i` may collide with tag `j`. Every mutation writes both
/// `[i][j]` and `[j][i]`, so the matrix stays symmetric. All pairs start enabled.
#[derive(Clone, Debug)]
pub struct TagTable {
    names: Vec<String>,
    index: HashMap<String, TagIndex>,
    masks: [BitmaskFlags<u16>; MAX_TAGS],
}

impl TagTable {
    pub fn new<S: AsRef<str>>(names: &[S]) -> PhysicsResult<Self> {
        if names.len() > MAX_TAGS {
            return Err(PhysicsError::TooManyTags(names.len()));
        }
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if index.insert(name.to_owned(), i as TagIndex).is_some() {
                return Err(PhysicsError::DuplicateTag(name.to_owned()));
            }
        }
        Ok(Self {
            names: names.iter().map(|n| n.as_ref().to_owned()).collect(),
            index,
            masks: [BitmaskFlags::all(); MAX_TAGS],
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: TagIndex) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    pub fn lookup(&self, name: &str) -> PhysicsResult<TagIndex> {
        self.index.get(name).copied().ok_or_else(|| {
            log::warn!("unknown collision tag {name:?}");
            PhysicsError::InvalidTag(name.to_owned())
        })
    }

    /// Enable or disable collision between two tags, in both directions.
    pub fn set_enabled(&mut self, a: &str, b: &str, enabled: bool) -> PhysicsResult<()> {
        let (i, j) = (self.lookup(a)?, self.lookup(b)?);
        self.masks[i as usize].set(TagBit(j), enabled);
        self.masks[j as usize].set(TagBit(i), enabled);
        Ok(())
    }

    pub fn is_enabled(&self, a: &str, b: &str) -> PhysicsResult<bool> {
        let (i, j) = (self.lookup(a)?, self.lookup(b)?);
        Ok(self.pair_enabled(i, j))
    }

    #[inline]
    fn pair_enabled(&self, i: TagIndex, j: TagIndex) -> bool {
        self.masks[i as usize].has(TagBit(j)) && self.masks[j as usize].has(TagBit(i))
    }

    /// Whether colliders with these tags may touch. Untagged colliders touch everything.
    pub fn allows(&self, a: Option<TagIndex>, b: Option<TagIndex>) -> bool {
        match (a, b) {
            (Some(i), Some(j)) => self.pair_enabled(i, j),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> TagTable {
        TagTable::new(names).unwrap()
    }

    #[test]
    fn every_pair_starts_enabled() {
        let t = table(&["a", "b", "c"]);
        for x in ["a", "b", "c"] {
            for y in ["a", "b", "c"] {
                assert!(t.is_enabled(x, y).unwrap());
            }
        }
    }

    #[test]
    fn toggling_is_symmetric_for_every_pair() {
        let names: Vec<String> = (0..MAX_TAGS).map(|i| format!("t{i}")).collect();
        let mut t = TagTable::new(&names).unwrap();
        for a in &names {
            for b in &names {
                t.set_enabled(a, b, false).unwrap();
                assert!(!t.is_enabled(a, b).unwrap());
                assert!(!t.is_enabled(b, a).unwrap());
                t.set_enabled(b, a, true).unwrap();
                assert!(t.is_enabled(a, b).unwrap());
                assert!(t.is_enabled(b, a).unwrap());
            }
        }
    }

    #[test]
    fn unknown_names_are_rejected_without_mutation() {
        let mut t = table(&["a", "b"]);
        assert_eq!(
            t.set_enabled("a", "zzz", false),
            Err(PhysicsError::InvalidTag("zzz".into()))
        );
        assert!(t.is_enabled("a", "a").unwrap());
        assert!(t.is_enabled("zzz", "a").is_err());
    }

    #[test]
    fn untagged_always_allowed() {
        let mut t = table(&["a"]);
        t.set_enabled("a", "a", false).unwrap();
        assert!(!t.allows(Some(0), Some(0)));
        assert!(t.allows(None, Some(0)));
        assert!(t.allows(Some(0), None));
        assert!(t.allows(None, None));
    }

    #[test]
    fn construction_validates_names() {
        let many: Vec<String> = (0..=MAX_TAGS).map(|i| i.to_string()).collect();
        assert_eq!(
            TagTable::new(&many).unwrap_err(),
            PhysicsError::TooManyTags(MAX_TAGS + 1)
        );
        assert_eq!(
            TagTable::new(&["x", "y", "x"]).unwrap_err(),
            PhysicsError::DuplicateTag("x".into())
        );
        let t = table(&["x", "y"]);
        assert_eq!(t.name(1), Some("y"));
        assert_eq!(t.name(2), None);
        assert_eq!(t.lookup("x"), Ok(0));
    }
}
