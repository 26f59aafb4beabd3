use zeroize::Zeroizing;

use crate::ports::secret_source::SecretSource;

/// Secrets injected by the CI environment into the runner process.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn get(&self, name: &str) -> Option<Zeroizing<String>> {
        std::env::var(name).ok().map(Zeroizing::new)
    }
}
