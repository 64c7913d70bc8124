//! Testing utilities shared by unit and integration tests
//!
//! - `fake_ytdlp`: writes a shell script that behaves like a scripted yt-dlp
//! - `recorder`: a `ChatOutbox` that records every outbound call instead of
//!   talking to Telegram
//! - `stub_source`: an in-process `FetchAdapter` with scripted results
//!
//! ## Usage
//!
//! ```rust,ignore
//! let fake = FakeYtDlp::new(dir.path()).writes_files(&[("clip.mp4", 5 * 1024 * 1024)]).install()?;
//! let settings = fake.settings(Duration::from_secs(10));
//! let outbox = RecordingOutbox::new();
//! // drive the dispatcher, then inspect outbox.calls()
//! ```

pub mod fake_ytdlp;
pub mod recorder;
pub mod stub_source;

pub use fake_ytdlp::{FakeYtDlp, InstalledFake};
pub use recorder::{OutboundCall, RecordingOutbox};
pub use stub_source::StubSource;
