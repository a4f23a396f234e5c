/// One page of results plus the total number of rows the unpaged query
/// matches.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults<R> {
    pub results: Vec<R>,
    pub total: u64,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl<R> QueryResults<R> {
    pub fn results(&self) -> &[R] {
        &self.results
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<R> {
        self.results
    }
}
