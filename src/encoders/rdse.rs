//! Random Distributed Scalar Encoder (RDSE).
//!
//! The RDSE maps a scalar to `active_bits` pseudo-random bits of a
//! `size`-bit SDR. Values are first quantized into buckets of width
//! `resolution`; bucket `b` hashes the keys `b, b + 1, ..., b + active_bits - 1`,
//! so adjacent buckets share all but one key and therefore most of their bits.
//! No input range is needed up front.

use crate::encoders::Encoder;
use crate::error::{CorticalError, Result};
use crate::types::{Real, Sdr, UInt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for creating an RDSE.
///
/// `active_bits` and `sparsity` are mutually exclusive; set exactly one.
/// `radius`, `resolution` and `category` are mutually exclusive; set exactly one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RdseParams {
    /// Total number of bits in the output SDR.
    pub size: UInt,

    /// Number of active bits per encoding.
    ///
    /// Adjacent buckets share `active_bits - 1` keys, so with a single active
    /// bit two values closer than `resolution` can still share no bits when
    /// they fall on either side of a bucket edge. Use at least 2 for
    /// semantic overlap.
    pub active_bits: UInt,

    /// Fraction of active bits; `active_bits = round(size * sparsity)`.
    pub sparsity: Real,

    /// Inputs further apart than the radius share no hash keys.
    pub radius: Real,

    /// Width of one bucket. Inputs at least this far apart are encoded
    /// differently.
    pub resolution: Real,

    /// Treat inputs as non-negative integer categories.
    pub category: bool,

    /// Hash seed. Different seeds give unrelated encodings.
    pub seed: u32,
}

impl Default for RdseParams {
    fn default() -> Self {
        Self {
            size: 400,
            active_bits: 0,
            sparsity: 0.0,
            radius: 0.0,
            resolution: 0.0,
            category: false,
            seed: 0,
        }
    }
}

/// Random Distributed Scalar Encoder.
///
/// Every encoding of a finite value has exactly `active_bits` bits: when two
/// keys hash to the same bit the later one probes forward to the next free
/// bit. NaN encodes to the empty SDR.
///
/// # Example
///
/// ```rust
/// use cortical::encoders::{Encoder, RandomDistributedScalarEncoder, RdseParams};
///
/// let encoder = RandomDistributedScalarEncoder::new(RdseParams {
///     size: 1000,
///     sparsity: 0.05,
///     resolution: 1.0,
///     seed: 7,
///     ..Default::default()
/// })
/// .unwrap();
///
/// let sdr = encoder.encode_to_sdr(50.0).unwrap();
/// assert_eq!(sdr.get_sum(), 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RandomDistributedScalarEncoder {
    size: UInt,
    active_bits: UInt,
    sparsity: Real,
    radius: Real,
    resolution: Real,
    category: bool,
    seed: u32,
    dimensions: Vec<UInt>,
}

/// Short alias.
pub type Rdse = RandomDistributedScalarEncoder;

impl RandomDistributedScalarEncoder {
    /// Creates a new RDSE.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::InvalidParameter`] if `size` is zero, if not
    /// exactly one of `active_bits`/`sparsity` or of
    /// `radius`/`resolution`/`category` is set, or if the resulting active
    /// bit count is not in `1..=size`.
    pub fn new(params: RdseParams) -> Result<Self> {
        if params.size == 0 {
            return invalid("size", "Must be > 0");
        }

        match (params.active_bits > 0, params.sparsity > 0.0) {
            (false, false) => return invalid("active_bits/sparsity", "Need one of: 'active_bits' or 'sparsity'"),
            (true, true) => {
                return invalid("active_bits/sparsity", "Specify only one of: 'active_bits' or 'sparsity'")
            }
            _ => {}
        }

        let num_resolution_args = u8::from(params.radius > 0.0)
            + u8::from(params.resolution > 0.0)
            + u8::from(params.category);
        if num_resolution_args == 0 {
            return invalid(
                "radius/resolution/category",
                "Need one of: 'radius', 'resolution', 'category'",
            );
        }
        if num_resolution_args > 1 {
            return invalid(
                "radius/resolution/category",
                "Specify only one of: 'radius', 'resolution', 'category'",
            );
        }

        let active_bits = if params.sparsity > 0.0 {
            if params.sparsity > 1.0 {
                return invalid("sparsity", "Must be in range (0, 1]");
            }
            (params.size as Real * params.sparsity).round() as UInt
        } else {
            params.active_bits
        };
        if active_bits == 0 {
            return invalid("active_bits", "Computed active_bits must be > 0");
        }
        if active_bits > params.size {
            return invalid("active_bits", "Must be <= size");
        }

        let (radius, resolution) = if params.category {
            (1.0, 1.0 / active_bits as Real)
        } else if params.radius > 0.0 {
            (params.radius, params.radius / active_bits as Real)
        } else {
            (active_bits as Real * params.resolution, params.resolution)
        };

        log::debug!(
            "rdse: size {}, {active_bits} active bits, resolution {resolution}",
            params.size
        );

        Ok(Self {
            size: params.size,
            active_bits,
            sparsity: active_bits as Real / params.size as Real,
            radius,
            resolution,
            category: params.category,
            seed: params.seed,
            dimensions: vec![params.size],
        })
    }

    /// Returns the number of active bits per encoding.
    pub fn active_bits(&self) -> UInt {
        self.active_bits
    }

    /// Returns the effective sparsity, `active_bits / size`.
    pub fn sparsity(&self) -> Real {
        self.sparsity
    }

    /// Returns the bucket width.
    pub fn resolution(&self) -> Real {
        self.resolution
    }

    /// Returns the radius.
    pub fn radius(&self) -> Real {
        self.radius
    }

    /// Returns whether this is a category encoder.
    pub fn category(&self) -> bool {
        self.category
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Bucket index of a finite value.
    fn bucket(&self, value: Real) -> Result<i64> {
        if self.category {
            // One bucket per category, spaced so neighbors share no keys.
            (value as i64)
                .checked_mul(i64::from(self.active_bits))
                .ok_or_else(|| CorticalError::InvalidParameter {
                    name: "value",
                    message: format!("Category {value} is too large for {} active bits", self.active_bits),
                })
        } else {
            Ok((f64::from(value) / f64::from(self.resolution)).floor() as i64)
        }
    }

    /// MurmurHash3 (x86, 32-bit) of a single little-endian `u32` block.
    #[inline]
    fn murmur_hash3_32(key: u32, seed: u32) -> u32 {
        const C1: u32 = 0xcc9e_2d51;
        const C2: u32 = 0x1b87_3593;

        let mut k = key.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);

        let mut h = seed ^ k;
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);

        h ^= 4;
        h ^= h >> 16;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^= h >> 16;
        h
    }
}

fn invalid<T>(name: &'static str, message: &str) -> Result<T> {
    Err(CorticalError::InvalidParameter {
        name,
        message: message.to_string(),
    })
}

impl Encoder<Real> for RandomDistributedScalarEncoder {
    fn dimensions(&self) -> &[UInt] {
        &self.dimensions
    }

    fn size(&self) -> usize {
        self.size as usize
    }

    fn encode(&self, value: Real, output: &mut Sdr) -> Result<()> {
        if output.dimensions() != self.dimensions.as_slice() {
            return Err(CorticalError::DimensionMismatch {
                expected: self.dimensions.clone(),
                actual: output.dimensions().to_vec(),
            });
        }

        if value.is_nan() {
            output.zero();
            return Ok(());
        }

        if self.category && (value < 0.0 || value.fract() != 0.0) {
            return Err(CorticalError::InvalidParameter {
                name: "value",
                message: "Input to category encoder must be a non-negative integer".to_string(),
            });
        }

        let bucket = self.bucket(value)?;
        let size = self.size as usize;
        let mut taken = vec![false; size];
        let mut sparse = Vec::with_capacity(self.active_bits as usize);

        for offset in 0..i64::from(self.active_bits) {
            // Keys wrap to 32 bits before hashing.
            let key = bucket.wrapping_add(offset) as u32;
            let mut bit = Self::murmur_hash3_32(key, self.seed) as usize % size;
            while taken[bit] {
                bit = (bit + 1) % size;
            }
            taken[bit] = true;
            sparse.push(bit as u32);
        }

        sparse.sort_unstable();
        output.set_sparse_unchecked(sparse);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(params: RdseParams) -> Rdse {
        Rdse::new(params).unwrap()
    }

    #[test]
    fn test_create_rdse() {
        let enc = encoder(RdseParams {
            size: 1000,
            sparsity: 0.05,
            resolution: 1.23,
            ..Default::default()
        });

        assert_eq!(enc.size(), 1000);
        assert_eq!(enc.active_bits(), 50);
        assert!((enc.radius() - 61.5).abs() < 1e-3);
    }

    #[test]
    fn test_radius_sets_resolution() {
        let enc = encoder(RdseParams {
            size: 1000,
            active_bits: 50,
            radius: 10.0,
            ..Default::default()
        });
        assert!((enc.resolution() - 0.2).abs() < 1e-6);
        assert!((enc.sparsity() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_params() {
        let cases = [
            RdseParams {
                size: 0,
                sparsity: 0.1,
                resolution: 1.0,
                ..Default::default()
            },
            RdseParams {
                size: 100,
                resolution: 1.0,
                ..Default::default()
            },
            RdseParams {
                size: 100,
                active_bits: 10,
                sparsity: 0.1,
                resolution: 1.0,
                ..Default::default()
            },
            RdseParams {
                size: 100,
                active_bits: 10,
                ..Default::default()
            },
            RdseParams {
                size: 100,
                active_bits: 10,
                radius: 1.0,
                category: true,
                ..Default::default()
            },
            RdseParams {
                size: 100,
                sparsity: 1.5,
                resolution: 1.0,
                ..Default::default()
            },
            RdseParams {
                size: 100,
                sparsity: 0.001,
                resolution: 1.0,
                ..Default::default()
            },
            RdseParams {
                size: 10,
                active_bits: 11,
                resolution: 1.0,
                ..Default::default()
            },
        ];
        for params in cases {
            let err = Rdse::new(params.clone()).unwrap_err();
            assert!(err.is_config_error(), "{params:?}");
        }
    }

    #[test]
    fn test_exact_active_bits() {
        // Small size forces collisions that must be probed away.
        let enc = encoder(RdseParams {
            size: 20,
            active_bits: 15,
            resolution: 1.0,
            seed: 3,
            ..Default::default()
        });
        for v in -50..50 {
            let sdr = enc.encode_to_sdr(v as Real * 0.7).unwrap();
            assert_eq!(sdr.get_sum(), 15);
        }
    }

    #[test]
    fn test_full_size_encoding() {
        let enc = encoder(RdseParams {
            size: 8,
            active_bits: 8,
            resolution: 1.0,
            ..Default::default()
        });
        assert_eq!(enc.encode_to_sdr(3.0).unwrap().get_sum(), 8);
    }

    #[test]
    fn test_encode_nan() {
        let enc = encoder(RdseParams {
            size: 1000,
            sparsity: 0.05,
            resolution: 1.0,
            ..Default::default()
        });
        let mut sdr = enc.encode_to_sdr(1.0).unwrap();
        enc.encode(Real::NAN, &mut sdr).unwrap();
        assert_eq!(sdr.get_sum(), 0);
    }

    #[test]
    fn test_wrong_output_size() {
        let enc = encoder(RdseParams {
            size: 100,
            sparsity: 0.1,
            radius: 10.0,
            ..Default::default()
        });
        let mut out = Sdr::new(&[99]);
        out.set_sparse(&[4]).unwrap();

        let err = enc.encode(5.0, &mut out).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert_eq!(out.get_sparse(), vec![4]);
    }

    #[test]
    fn test_deterministic_and_seeded() {
        let params = RdseParams {
            size: 1000,
            sparsity: 0.05,
            resolution: 1.0,
            seed: 42,
            ..Default::default()
        };
        let a = encoder(params.clone()).encode_to_sdr(44.4).unwrap();
        let b = encoder(params.clone()).encode_to_sdr(44.4).unwrap();
        assert_eq!(a, b);

        let c = encoder(RdseParams { seed: 123, ..params })
            .encode_to_sdr(44.4)
            .unwrap();
        assert_ne!(a.get_sparse(), c.get_sparse());
    }

    #[test]
    fn test_seed_zero_is_a_real_seed() {
        let params = RdseParams {
            size: 500,
            active_bits: 20,
            resolution: 1.0,
            seed: 0,
            ..Default::default()
        };
        let a = encoder(params.clone()).encode_to_sdr(9.0).unwrap();
        let b = encoder(params).encode_to_sdr(9.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_semantic_similarity() {
        let enc = encoder(RdseParams {
            size: 1000,
            active_bits: 50,
            resolution: 1.0,
            seed: 1,
            ..Default::default()
        });

        let sdr_10 = enc.encode_to_sdr(10.0).unwrap();
        let sdr_11 = enc.encode_to_sdr(11.0).unwrap();
        let sdr_100 = enc.encode_to_sdr(100.0).unwrap();

        assert!(sdr_10.get_overlap(&sdr_11) >= 45);
        assert!(sdr_10.get_overlap(&sdr_11) > sdr_10.get_overlap(&sdr_100));
    }

    #[test]
    fn test_negative_values_floor() {
        let enc = encoder(RdseParams {
            size: 1000,
            active_bits: 30,
            resolution: 1.0,
            seed: 5,
            ..Default::default()
        });
        // -0.5 and -0.1 share bucket -1; 0.1 is bucket 0.
        let a = enc.encode_to_sdr(-0.5).unwrap();
        let b = enc.encode_to_sdr(-0.1).unwrap();
        let c = enc.encode_to_sdr(0.1).unwrap();
        assert_eq!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_category_encoder() {
        let enc = encoder(RdseParams {
            size: 1000,
            active_bits: 50,
            category: true,
            seed: 11,
            ..Default::default()
        });

        let sdr_0 = enc.encode_to_sdr(0.0).unwrap();
        let sdr_1 = enc.encode_to_sdr(1.0).unwrap();
        assert_eq!(sdr_0.get_sum(), 50);
        assert!(sdr_0.get_overlap(&sdr_1) < 15);

        assert!(enc.encode_to_sdr(1.5).is_err());
        assert!(enc.encode_to_sdr(-1.0).is_err());
    }

    #[test]
    fn test_huge_category_is_rejected() {
        let enc = encoder(RdseParams {
            size: 1000,
            active_bits: 50,
            category: true,
            ..Default::default()
        });

        let mut out = enc.encode_to_sdr(3.0).unwrap();
        let before = out.clone();
        let err = enc.encode(1.0e19, &mut out).unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(out, before);

        assert_eq!(enc.encode_to_sdr(1.0e12).unwrap().get_sum(), 50);
    }

    #[test]
    fn test_two_active_bits_overlap_across_bucket_edges() {
        let enc = encoder(RdseParams {
            size: 1000,
            active_bits: 2,
            resolution: 1.0,
            seed: 3,
            ..Default::default()
        });

        for i in -50..50 {
            let edge = i as Real;
            let below = enc.encode_to_sdr(edge - 0.1).unwrap();
            let above = enc.encode_to_sdr(edge + 0.1).unwrap();
            assert!(below.get_overlap(&above) >= 1, "no overlap at {edge}");
        }
    }
}
