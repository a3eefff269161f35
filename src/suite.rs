use crate::corpus::ImageRef;
use crate::harness::RunConfig;
use crate::hashing::HashLibrary;
use crate::AlgorithmLabel;
use std::hint::black_box;
use std::io;

/// Order the combined "multi" operation runs the algorithms in.
pub const MULTI_ORDER: [AlgorithmLabel; 4] = [
    AlgorithmLabel::Ahash,
    AlgorithmLabel::Phash,
    AlgorithmLabel::Whash,
    AlgorithmLabel::Dhash,
];

/// Every hash operation bound to one image and one hash size.
///
/// Operations decode the image on each call, so no two calls share a decoded
/// instance.
pub struct AlgorithmSuite<'a, L: HashLibrary> {
    library: &'a L,
    image: &'a ImageRef,
    cfg: &'a RunConfig,
}

impl<'a, L: HashLibrary> AlgorithmSuite<'a, L> {
    pub fn new(library: &'a L, image: &'a ImageRef, cfg: &'a RunConfig) -> Self {
        Self {
            library,
            image,
            cfg,
        }
    }

    pub fn image(&self) -> &ImageRef {
        self.image
    }

    /// Hash an already-decoded image with `alg`.
    pub fn hash(&self, alg: AlgorithmLabel, decoded: &L::Image) -> io::Result<Vec<u8>> {
        run_hash(self.library, self.cfg, alg, decoded)
    }

    /// Zero-argument unit: decode, then hash with `alg`.
    pub fn operation(&self, alg: AlgorithmLabel) -> impl FnMut() -> io::Result<Vec<u8>> + 'a {
        let (library, image, cfg) = (self.library, self.image, self.cfg);
        move || {
            let decoded = library.open(&image.path)?;
            run_hash(library, cfg, alg, &decoded)
        }
    }

    /// Zero-argument unit: decode once, then run [`MULTI_ORDER`] with each
    /// algorithm on its own copy.
    pub fn multi(&self) -> impl FnMut() -> io::Result<()> + 'a {
        let (library, image, cfg) = (self.library, self.image, self.cfg);
        move || {
            let decoded = library.open(&image.path)?;
            for alg in MULTI_ORDER {
                let copy = decoded.clone();
                black_box(run_hash(library, cfg, alg, &copy)?);
            }
            Ok(())
        }
    }
}

fn run_hash<L: HashLibrary>(
    library: &L,
    cfg: &RunConfig,
    alg: AlgorithmLabel,
    decoded: &L::Image,
) -> io::Result<Vec<u8>> {
    let n = cfg.hash_size;
    match alg {
        AlgorithmLabel::Ahash => library.average_hash(decoded, n),
        AlgorithmLabel::Phash => library.phash(decoded, n),
        AlgorithmLabel::Dhash => library.dhash(decoded, n),
        AlgorithmLabel::Whash => library.whash(decoded, n, cfg.remove_max_haar_ll),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// Records every call; optionally sleeps per hash or fails on open.
    #[derive(Default)]
    pub(crate) struct StubLibrary {
        pub calls: RefCell<Vec<String>>,
        pub delay: Option<Duration>,
        pub fail_open: bool,
    }

    impl StubLibrary {
        pub(crate) fn sleeping(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        fn record(&self, call: String) -> io::Result<Vec<u8>> {
            if let Some(d) = self.delay {
                std::thread::sleep(d);
            }
            self.calls.borrow_mut().push(call);
            Ok(vec![0; 8])
        }
    }

    impl HashLibrary for StubLibrary {
        type Image = PathBuf;

        fn open(&self, path: &Path) -> io::Result<PathBuf> {
            if self.fail_open {
                return Err(io::Error::other(format!("cannot decode {}", path.display())));
            }
            self.calls.borrow_mut().push(format!("open:{}", path.display()));
            Ok(path.to_path_buf())
        }

        fn average_hash(&self, _image: &PathBuf, hash_size: u32) -> io::Result<Vec<u8>> {
            self.record(format!("ahash:{hash_size}"))
        }

        fn phash(&self, _image: &PathBuf, hash_size: u32) -> io::Result<Vec<u8>> {
            self.record(format!("phash:{hash_size}"))
        }

        fn dhash(&self, _image: &PathBuf, hash_size: u32) -> io::Result<Vec<u8>> {
            self.record(format!("dhash:{hash_size}"))
        }

        fn whash(
            &self,
            _image: &PathBuf,
            hash_size: u32,
            remove_max_haar_ll: bool,
        ) -> io::Result<Vec<u8>> {
            self.record(format!("whash:{hash_size}:{remove_max_haar_ll}"))
        }
    }

    #[test]
    fn test_operation_decodes_every_call() {
        let lib = StubLibrary::default();
        let image = ImageRef::new("s1", "corpus/s1");
        let cfg = RunConfig::default();
        let suite = AlgorithmSuite::new(&lib, &image, &cfg);

        let mut op = suite.operation(AlgorithmLabel::Dhash);
        op().unwrap();
        op().unwrap();

        assert_eq!(
            *lib.calls.borrow(),
            vec!["open:corpus/s1", "dhash:8", "open:corpus/s1", "dhash:8"]
        );
    }

    #[test]
    fn test_whash_gets_configured_flags() {
        let lib = StubLibrary::default();
        let image = ImageRef::new("s1", "s1");
        let cfg = RunConfig {
            hash_size: 16,
            remove_max_haar_ll: true,
            ..RunConfig::default()
        };
        let suite = AlgorithmSuite::new(&lib, &image, &cfg);
        suite.operation(AlgorithmLabel::Whash)().unwrap();
        assert_eq!(lib.calls.borrow()[1], "whash:16:true");
    }

    #[test]
    fn test_multi_runs_fixed_order_after_one_decode() {
        let lib = StubLibrary::default();
        let image = ImageRef::new("s1", "s1");
        let cfg = RunConfig::default();
        let suite = AlgorithmSuite::new(&lib, &image, &cfg);
        suite.multi()().unwrap();
        assert_eq!(
            *lib.calls.borrow(),
            vec!["open:s1", "ahash:8", "phash:8", "whash:8:false", "dhash:8"]
        );
    }

    #[test]
    fn test_open_failure_propagates() {
        let lib = StubLibrary {
            fail_open: true,
            ..Default::default()
        };
        let image = ImageRef::new("bad", "bad");
        let cfg = RunConfig::default();
        let suite = AlgorithmSuite::new(&lib, &image, &cfg);
        assert!(suite.operation(AlgorithmLabel::Ahash)().is_err());
        assert!(suite.multi()().is_err());
        assert!(lib.calls.borrow().is_empty());
    }
}
