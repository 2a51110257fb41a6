use super::Requirement;
use elsa::sync::FrozenMap;

/// Hands out the resolver's map key for each requirement, memoized so the
/// same (equal) requirement always gets the same key.
///
/// This matters for requirements without a name, which get a random
/// placeholder key: without the memo, asking twice would give two different
/// keys. Entries are never evicted; a cache lives as long as whoever owns it
/// (normally one resolver run). Safe to share between threads.
#[derive(Default)]
pub struct IdentityCache {
    // memo table, so we can hand out references instead of cloning keys
    memo: FrozenMap<Requirement, String>,
}

impl IdentityCache {
    pub fn new() -> IdentityCache {
        Default::default()
    }

    pub fn identify(&self, req: &Requirement) -> &str {
        if let Some(identity) = self.memo.get(req) {
            return identity;
        }
        let identity = req
            .identity()
            .unwrap_or_else(|| format!(":empty:{}", uuid::Uuid::new_v4().simple()));
        // if another thread got here first, this keeps its key and drops ours
        self.memo.insert(req.clone(), identity)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_named_identity() {
        let config = Config::new("/");
        let cache = IdentityCache::new();
        let r = Requirement::from_line("Foo_Bar[b,a]>=1", &config).unwrap();
        assert_eq!(cache.identify(&r), "foo-bar[a,b]");
        let r = Requirement::from_line("Foo_Bar>=1", &config).unwrap();
        assert_eq!(cache.identify(&r), "foo-bar");
    }

    #[test]
    fn test_identity_independent_of_arrival_order() {
        let config = Config::new("/");
        let upper = Requirement::from_line("foo[A]", &config).unwrap();
        let lower = Requirement::from_line("foo[a]", &config).unwrap();

        let first = IdentityCache::new();
        first.identify(&upper);
        let second = IdentityCache::new();
        second.identify(&lower);
        assert_eq!(first.identify(&lower), "foo[a]");
        assert_eq!(second.identify(&upper), "foo[a]");
    }

    #[test]
    fn test_unnamed_identity() {
        let config = Config::new("/");
        let cache = IdentityCache::new();
        let a = Requirement::from_line("https://example.com/a.tar.gz", &config).unwrap();
        let b = Requirement::from_line("https://example.com/b.tar.gz", &config).unwrap();

        let id_a = cache.identify(&a).to_owned();
        assert!(id_a.starts_with(":empty:"));
        assert_eq!(cache.identify(&a), id_a);
        let a_again = Requirement::from_line("https://example.com/a.tar.gz", &config).unwrap();
        assert_eq!(cache.identify(&a_again), id_a);
        assert_ne!(cache.identify(&b), id_a);

        // a different cache makes up a different placeholder
        assert_ne!(IdentityCache::new().identify(&a), id_a);
    }

    #[test]
    fn test_shared_between_threads() {
        let config = Config::new("/");
        let cache = IdentityCache::new();
        let r = Requirement::from_line("https://example.com/a.tar.gz", &config).unwrap();
        let ids: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| cache.identify(&r).to_owned()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(ids.iter().all(|id| id == &ids[0]));
    }
}
