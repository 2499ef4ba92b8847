use super::error::ApiError;

/// Fetched collection plus its loading flag and last error, for any entity.
#[derive(Debug, Clone)]
pub struct Resource<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Resource {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> Resource<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin(&mut self) {
        self.loading = true;
    }

    /// Store a fetch result. A failure empties the collection and keeps
    /// the error text.
    pub fn settle(&mut self, result: Result<Vec<T>, ApiError>) {
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(e) => {
                self.items.clear();
                self.error = Some(e.to_string());
            }
        }
    }

    /// Like [`settle`](Self::settle) but a failure just yields an empty
    /// collection.
    pub fn settle_or_empty(&mut self, result: Result<Vec<T>, ApiError>) {
        if let Err(e) = &result {
            log::debug!("Ignoring failed optional fetch: {e}");
        }
        self.loading = false;
        self.items = result.unwrap_or_default();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_clears_items_and_records_message() {
        let mut r: Resource<u32> = Resource::default();
        r.begin();
        assert!(r.is_loading());
        r.settle(Ok(vec![1, 2]));
        assert_eq!(r.items(), &[1, 2]);
        assert!(!r.is_loading());

        r.settle(Err(ApiError::Transport("Network Error".into())));
        assert!(r.items().is_empty());
        assert_eq!(r.error(), Some("Network Error"));
    }

    #[test]
    fn optional_failure_is_silent() {
        let mut r: Resource<u32> = Resource::default();
        r.settle_or_empty(Err(ApiError::Transport("boom".into())));
        assert!(r.items().is_empty());
        assert_eq!(r.error(), None);
    }
}
