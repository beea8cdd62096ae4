#![forbid(unsafe_code)]

pub mod composite;
pub mod content;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod filter;
pub mod segmentation;
pub mod session;
pub mod style;
pub mod text_mask;
pub mod typeface;

pub use content::{ContentConfig, load_content_config};
pub use dispatch::{Dispatcher, EventOutcome, UiEvent};
pub use error::{PortraitError, PortraitResult};
pub use export::{EXPORT_FILENAME, EXPORT_SCALE, ExportOutput, ExportReport, RenderTarget, export};
pub use filter::FilterChain;
pub use segmentation::{DetectOptions, MaskFile, ModelFidelity, SegmentationProvider};
pub use session::{DetectTicket, Session, SessionState};
pub use style::StyleParams;
pub use text_mask::{TextSpec, normalize_text, rasterize_text_mask};
pub use typeface::{FontdueFace, GlyphRaster, Typeface};
