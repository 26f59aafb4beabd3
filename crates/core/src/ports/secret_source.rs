use zeroize::Zeroizing;

/// Read access to secrets injected into the runner's own environment.
pub trait SecretSource: Send + Sync {
    fn get(&self, name: &str) -> Option<Zeroizing<String>>;

    /// Like [`SecretSource::get`] but treats empty values as missing.
    fn get_non_empty(&self, name: &str) -> Option<Zeroizing<String>> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }
}
