/// The slice of a DOM the bridge needs: find the mount element and walk up.
pub trait ElementTree {
    type Node: Clone;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn tag_name(&self, node: &Self::Node) -> String;

    /// `true` for `<body>` and the document element.
    fn is_document_root(&self, node: &Self::Node) -> bool;

    /// Toggles the visibility style without removing the node from layout.
    fn set_hidden(&mut self, node: &Self::Node, hidden: bool);
}
