use cfr_error::Result;
use cfr_types::{Guid, HobList, OptionFlags};
use tracing::warn;

use crate::node::FormView;

/// A read-only handle over one CFR form tree.
///
/// Construction validates only the root: it must be a form that fits in the
/// buffer and carries a UI name. Everything below it is checked while
/// walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfrTree<'a> {
    buf: &'a [u8],
    root: FormView<'a>,
}

impl<'a> CfrTree<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        let root = FormView::decode(buf, 0, buf.len(), 0)?;
        Ok(Self { buf, root })
    }

    /// Every tree carried by GUID HOBs named `guid`, in list order.
    ///
    /// A payload whose root does not decode is logged and left out.
    #[must_use]
    pub fn from_hob_list(hobs: &HobList<'a>, guid: Guid) -> Vec<Self> {
        hobs.guid_data(guid)
            .filter_map(|data| match Self::new(data) {
                Ok(tree) => Some(tree),
                Err(error) => {
                    warn!(error = %error, "ignoring CFR HOB with malformed root form");
                    None
                }
            })
            .collect()
    }

    /// The buffer the tree was built over. May extend past the root form.
    #[must_use]
    pub const fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// The root form record, header through last child.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[..self.root.end]
    }

    #[must_use]
    pub const fn root(&self) -> &FormView<'a> {
        &self.root
    }

    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.root.name
    }

    #[must_use]
    pub const fn object_id(&self) -> u64 {
        self.root.fields.object_id
    }

    #[must_use]
    pub const fn flags(&self) -> OptionFlags {
        self.root.fields.flags
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.root.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfr_error::CfrError;
    use cfr_types::hob::{encode_end_of_list, encode_guid_hob};
    use cfr_types::{CfrBuilder, OptionBuilder};

    const GUID: Guid = Guid::from_fields(0xAA, 0xBB, 0xCC, [1, 2, 3, 4, 5, 6, 7, 8]);

    #[test]
    fn exposes_root_fields() {
        let blob = CfrBuilder::form("Main")
            .object_id(4)
            .flags(OptionFlags::SUPPRESS)
            .option(OptionBuilder::boolean("B", "B", false))
            .build();
        let tree = CfrTree::new(&blob).unwrap();
        assert_eq!(tree.name(), "Main");
        assert_eq!(tree.object_id(), 4);
        assert_eq!(tree.flags(), OptionFlags::SUPPRESS);
        assert_eq!(tree.size() as usize, blob.len());
        assert_eq!(tree.bytes(), blob.as_slice());
    }

    #[test]
    fn root_must_be_a_form() {
        let blob = OptionBuilder::number("N", "N", 1).build();
        let err = CfrTree::new(&blob).unwrap_err();
        assert!(matches!(err, CfrError::UnexpectedTag { .. }));
    }

    #[test]
    fn root_larger_than_buffer() {
        let blob = CfrBuilder::form("Main").with_size(512).build();
        assert!(matches!(
            CfrTree::new(&blob).unwrap_err(),
            CfrError::RecordOverrun { .. }
        ));
    }

    #[test]
    fn padded_payload_is_accepted() {
        let mut blob = CfrBuilder::form("Main").build();
        let len = blob.len();
        blob.resize(len + 7, 0);
        let tree = CfrTree::new(&blob).unwrap();
        assert_eq!(tree.bytes().len(), len);
    }

    #[test]
    fn trees_from_hob_list() {
        let main = CfrBuilder::form("Main").build();
        let advanced = CfrBuilder::form("Advanced").build();
        let mut list = encode_guid_hob(GUID, &main).unwrap();
        list.extend(encode_guid_hob(GUID, &[0xde, 0xad]).unwrap());
        list.extend(encode_guid_hob(GUID, &advanced).unwrap());
        list.extend(encode_end_of_list());

        let hobs = HobList::new(&list);
        let trees = CfrTree::from_hob_list(&hobs, GUID);
        let names: Vec<_> = trees.iter().map(CfrTree::name).collect();
        assert_eq!(names, ["Main", "Advanced"]);
    }
}
