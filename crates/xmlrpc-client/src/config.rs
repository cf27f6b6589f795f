use xmlrpc_codec::MULTICALL_METHOD;

/// Client behavior settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Method name used for batches. Responses to calls of this name are
    /// split per sub-call.
    pub multicall_method: String,
    /// Sequence number given to the first call.
    pub first_sequence: u64,
}

impl ClientConfig {
    pub fn with_multicall_method(mut self, method: impl Into<String>) -> Self {
        self.multicall_method = method.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            multicall_method: MULTICALL_METHOD.to_owned(),
            first_sequence: 1,
        }
    }
}
