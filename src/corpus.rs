//! Image corpus: labelled test images of increasing pixel size.
//!
//! A label doubles as the image's file name inside the corpus directory
//! (`<dir>/100px`, `<dir>/200px`, ...). Synthetic corpora can be generated
//! deterministically from a seed for machines without the reference images.

use image::{ImageFormat, Rgb, RgbImage};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io;
use std::path::{Path, PathBuf};

/// Reference corpus, smallest first.
pub const DEFAULT_CORPUS: [&str; 10] = [
    "100px", "200px", "300px", "500px", "1000px", "2000px", "3000px", "4000px", "6000px",
    "8000px",
];

/// A labelled image file. Never modified by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub label: String,
    pub path: PathBuf,
}

impl ImageRef {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Parse the edge length out of a `<N>px` label.
pub fn label_pixels(label: &str) -> Option<u32> {
    label.strip_suffix("px")?.parse().ok()
}

/// Ordered corpus; iteration order is measurement and output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    images: Vec<ImageRef>,
}

impl Corpus {
    pub fn new(images: Vec<ImageRef>) -> Self {
        Self { images }
    }

    /// Resolve each label to `dir/label`, keeping the given order.
    pub fn from_labels<S: AsRef<str>>(dir: &Path, labels: &[S]) -> Self {
        let images = labels
            .iter()
            .map(|l| ImageRef::new(l.as_ref(), dir.join(l.as_ref())))
            .collect();
        Self { images }
    }

    /// The reference corpus under `dir`.
    pub fn default_in(dir: &Path) -> Self {
        Self::from_labels(dir, &DEFAULT_CORPUS)
    }

    /// Discover `<N>px` files directly inside `dir`, ordered by `N`.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut found: Vec<(u32, ImageRef)> = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(px) = label_pixels(name) {
                found.push((px, ImageRef::new(name, entry.path())));
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.label.cmp(&b.1.label)));
        Ok(Self {
            images: found.into_iter().map(|(_, img)| img).collect(),
        })
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn per_label_seed(master_seed: u64, pixels: u32) -> u64 {
    master_seed
        .wrapping_add(u64::from(pixels))
        .wrapping_mul(0x517cc1b727220a95)
}

/// Deterministic N×N test image: a diagonal gradient with seeded noise.
pub fn synth_image(pixels: u32, seed: u64) -> RgbImage {
    let mut rng = ChaCha8Rng::seed_from_u64(per_label_seed(seed, pixels));
    let span = (2 * pixels.max(1)) as u64;
    RgbImage::from_fn(pixels, pixels, |x, y| {
        let base = ((u64::from(x) + u64::from(y)) * 255 / span) as u8;
        let noise = rng.next_u32().to_le_bytes();
        Rgb([
            base.wrapping_add(noise[0] >> 3),
            base.wrapping_add(noise[1] >> 3),
            base.wrapping_add(noise[2] >> 3),
        ])
    })
}

/// Write one PNG per `<N>px` label into `dir` and return the resulting corpus.
pub fn generate_corpus<S: AsRef<str>>(dir: &Path, labels: &[S], seed: u64) -> io::Result<Corpus> {
    let mut pixels = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.as_ref();
        match label_pixels(label) {
            Some(px) if px > 0 => pixels.push(px),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("corpus label must look like <N>px, got {label:?}"),
                ))
            }
        }
    }

    std::fs::create_dir_all(dir)?;
    let corpus = Corpus::from_labels(dir, labels);
    for (image, px) in corpus.images().iter().zip(pixels) {
        synth_image(px, seed)
            .save_with_format(&image.path, ImageFormat::Png)
            .map_err(|e| io::Error::other(format!("{}: {e}", image.path.display())))?;
    }
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_label_pixels() {
        assert_eq!(label_pixels("100px"), Some(100));
        assert_eq!(label_pixels("8000px"), Some(8000));
        assert_eq!(label_pixels("s1"), None);
        assert_eq!(label_pixels("px"), None);
        assert_eq!(label_pixels("12pxx"), None);
    }

    #[test]
    fn test_from_labels_keeps_order() {
        let corpus = Corpus::from_labels(Path::new("imgs"), &["200px", "100px"]);
        let labels: Vec<&str> = corpus.images().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["200px", "100px"]);
        assert_eq!(corpus.images()[0].path, Path::new("imgs/200px"));
    }

    #[test]
    fn test_default_corpus_is_ascending() {
        let corpus = Corpus::default_in(Path::new("."));
        assert_eq!(corpus.len(), 10);
        let px: Vec<u32> = corpus
            .images()
            .iter()
            .map(|i| label_pixels(&i.label).unwrap())
            .collect();
        assert!(px.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_synth_image_deterministic() {
        let a = synth_image(16, 42);
        let b = synth_image(16, 42);
        let c = synth_image(16, 43);
        assert_eq!(a.as_raw(), b.as_raw());
        assert_ne!(a.as_raw(), c.as_raw());
        assert_eq!(a.dimensions(), (16, 16));
    }

    #[test]
    fn test_generate_then_scan() {
        let dir = tempdir().unwrap();
        let corpus = generate_corpus(dir.path(), &["32px", "8px", "16px"], 7).unwrap();
        assert_eq!(corpus.len(), 3);
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let scanned = Corpus::scan(dir.path()).unwrap();
        let labels: Vec<&str> = scanned.images().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["8px", "16px", "32px"]);

        let decoded = image::ImageReader::open(&scanned.images()[1].path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_generate_rejects_bad_label() {
        let dir = tempdir().unwrap();
        let err = generate_corpus(dir.path(), &["16px", "large"], 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("16px").exists());
    }
}
