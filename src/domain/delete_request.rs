//! Delete request and batch models for the deletion pipeline.

/// One unit of deletion work: remove `item_id` on behalf of `owner_id`.
///
/// Submitted by the bulk-delete endpoint after the caller is authenticated.
/// Storage only honours the request when the stored record belongs to
/// `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteRequest {
    pub owner_id: String,
    pub item_id: String,
}

impl DeleteRequest {
    pub fn new(owner_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            item_id: item_id.into(),
        }
    }
}

/// An ordered group of delete requests handed to storage in one call.
///
/// Built by a batch accumulator. Batches leaving an accumulator are never
/// empty and never longer than the configured maximum batch size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteBatch(Vec<DeleteRequest>);

impl DeleteBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, request: DeleteRequest) {
        self.0.push(request);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeleteRequest> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<DeleteRequest> {
        self.0
    }
}

impl From<Vec<DeleteRequest>> for DeleteBatch {
    fn from(requests: Vec<DeleteRequest>) -> Self {
        Self(requests)
    }
}

impl<'a> IntoIterator for &'a DeleteBatch {
    type Item = &'a DeleteRequest;
    type IntoIter = std::slice::Iter<'a, DeleteRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
