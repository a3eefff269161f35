//! In-process hashing library.
//!
//! The harness only ever times these calls; hash values are opaque bytes and
//! are discarded by the caller. [`HashLibrary`] is the seam tests use to swap
//! in a deterministic stub.

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use image_hasher::{HashAlg, HasherConfig};
use std::io;
use std::path::Path;

/// The four hash functions plus image decoding.
pub trait HashLibrary {
    /// A decoded image. Cloning yields an independent copy.
    type Image: Clone;

    fn open(&self, path: &Path) -> io::Result<Self::Image>;

    fn average_hash(&self, image: &Self::Image, hash_size: u32) -> io::Result<Vec<u8>>;

    fn phash(&self, image: &Self::Image, hash_size: u32) -> io::Result<Vec<u8>>;

    fn dhash(&self, image: &Self::Image, hash_size: u32) -> io::Result<Vec<u8>>;

    fn whash(
        &self,
        image: &Self::Image,
        hash_size: u32,
        remove_max_haar_ll: bool,
    ) -> io::Result<Vec<u8>>;
}

/// Production backend: `image` for decoding, `image_hasher` for the
/// mean/DCT/gradient hashes, and a Haar low-pass for the wavelet hash.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageHasherLibrary;

fn check_hash_size(hash_size: u32) -> io::Result<()> {
    if hash_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "hash size must be at least 1",
        ));
    }
    Ok(())
}

fn hash_with(image: &DynamicImage, hash_size: u32, alg: HashAlg, dct: bool) -> io::Result<Vec<u8>> {
    check_hash_size(hash_size)?;
    let mut config = HasherConfig::new()
        .hash_size(hash_size, hash_size)
        .hash_alg(alg);
    if dct {
        config = config.preproc_dct();
    }
    let hash = config.to_hasher().hash_image(image);
    Ok(hash.as_bytes().to_vec())
}

fn pack_bits(bits: impl IntoIterator<Item = bool>) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, bit) in bits.into_iter().enumerate() {
        if i % 8 == 0 {
            out.push(0);
        }
        if bit {
            if let Some(last) = out.last_mut() {
                *last |= 0x80 >> (i % 8);
            }
        }
    }
    out
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// One level of the 2-D Haar approximation: each 2x2 block becomes (a+b+c+d)/2.
fn haar_lowpass(pixels: &[f32], side: usize) -> Vec<f32> {
    let half = side / 2;
    let mut out = Vec::with_capacity(half * half);
    for y in 0..half {
        for x in 0..half {
            let r0 = 2 * y * side + 2 * x;
            let r1 = r0 + side;
            out.push((pixels[r0] + pixels[r0 + 1] + pixels[r1] + pixels[r1 + 1]) / 2.0);
        }
    }
    out
}

/// Wavelet hash over a square power-of-two grayscale rescale of `image`.
pub fn wavelet_hash(
    image: &DynamicImage,
    hash_size: u32,
    remove_max_haar_ll: bool,
) -> io::Result<Vec<u8>> {
    check_hash_size(hash_size)?;
    if !hash_size.is_power_of_two() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("whash requires a power-of-two hash size, got {hash_size}"),
        ));
    }
    let min_side = image.width().min(image.height());
    if min_side == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty image"));
    }
    // Largest power of two not above the short side.
    let scale = (1u32 << (31 - min_side.leading_zeros())).max(hash_size);

    let gray = image::imageops::resize(&image.to_luma8(), scale, scale, FilterType::Lanczos3);
    let mut pixels: Vec<f32> = gray.as_raw().iter().map(|&p| f32::from(p) / 255.0).collect();

    if remove_max_haar_ll {
        // Zeroing the single max-level LL coefficient and reconstructing
        // removes exactly the image mean.
        let mean = pixels.iter().sum::<f32>() / pixels.len() as f32;
        for p in &mut pixels {
            *p -= mean;
        }
    }

    let mut side = scale as usize;
    while side > hash_size as usize {
        pixels = haar_lowpass(&pixels, side);
        side /= 2;
    }

    let med = median(&pixels);
    Ok(pack_bits(pixels.iter().map(|&p| p > med)))
}

impl HashLibrary for ImageHasherLibrary {
    type Image = DynamicImage;

    fn open(&self, path: &Path) -> io::Result<DynamicImage> {
        // Corpus files carry no extension; sniff the format from content.
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| io::Error::other(format!("{}: {e}", path.display())))
    }

    fn average_hash(&self, image: &DynamicImage, hash_size: u32) -> io::Result<Vec<u8>> {
        hash_with(image, hash_size, HashAlg::Mean, false)
    }

    fn phash(&self, image: &DynamicImage, hash_size: u32) -> io::Result<Vec<u8>> {
        hash_with(image, hash_size, HashAlg::Mean, true)
    }

    fn dhash(&self, image: &DynamicImage, hash_size: u32) -> io::Result<Vec<u8>> {
        hash_with(image, hash_size, HashAlg::Gradient, false)
    }

    fn whash(
        &self,
        image: &DynamicImage,
        hash_size: u32,
        remove_max_haar_ll: bool,
    ) -> io::Result<Vec<u8>> {
        wavelet_hash(image, hash_size, remove_max_haar_ll)
    }
}
