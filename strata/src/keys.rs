/// Redis key construction for the schema store.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    /// JSON document holding one collection schema.
    pub fn collection(&self, collection_id: &str) -> String {
        format!("{}:collection:{}", self.prefix, collection_id)
    }

    /// Set of every stored collection id.
    pub fn collection_index(&self) -> String {
        format!("{}:collections", self.prefix)
    }

    /// JSON document holding the applied-migration ledger.
    pub fn ledger(&self) -> String {
        format!("{}:_migrations", self.prefix)
    }
}
