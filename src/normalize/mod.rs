mod argo;
mod delimited;
mod ncei;

use chrono::NaiveDate;

use crate::domain::{RawPayload, SourceTag};
use crate::error::OceanError;
use crate::record::CanonicalRecordSet;

pub use argo::{ArgoNormalizer, parse_argo_date};
pub use delimited::{CopernicusNormalizer, NoaaNormalizer};
pub use ncei::{NCEI_COLUMN_SPANS, NceiNormalizer};

/// Maps one provider format into the canonical schema.
pub trait Normalizer {
    fn source(&self) -> SourceTag;

    /// Consumes `payload` and yields its canonical records.
    fn normalize(&self, payload: RawPayload) -> Result<CanonicalRecordSet, OceanError>;
}

/// `processing_date` is stamped on sources that carry no observation time.
pub fn normalizer_for(source: SourceTag, processing_date: NaiveDate) -> Box<dyn Normalizer> {
    match source {
        SourceTag::Noaa => Box::new(NoaaNormalizer),
        SourceTag::Copernicus => Box::new(CopernicusNormalizer),
        SourceTag::Argo => Box::new(ArgoNormalizer),
        SourceTag::Ncei => Box::new(NceiNormalizer::new(processing_date)),
    }
}
