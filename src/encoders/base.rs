//! The encoder trait.

use crate::error::Result;
use crate::types::{Sdr, UInt};

/// Converts values of type `T` into SDRs of a fixed shape.
pub trait Encoder<T> {
    /// Shape of the output SDR.
    fn dimensions(&self) -> &[UInt];

    /// Total number of output bits.
    fn size(&self) -> usize;

    /// Encodes `value` into `output`, replacing its contents.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionMismatch`](crate::CorticalError::DimensionMismatch)
    /// if `output` is not shaped like [`dimensions`](Self::dimensions). The
    /// output is left untouched in that case.
    fn encode(&self, value: T, output: &mut Sdr) -> Result<()>;

    /// Encodes `value` into a freshly allocated SDR.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`encode`](Self::encode).
    fn encode_to_sdr(&self, value: T) -> Result<Sdr> {
        let mut sdr = Sdr::new(self.dimensions());
        self.encode(value, &mut sdr)?;
        Ok(sdr)
    }
}
