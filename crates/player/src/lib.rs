// Twinplay - one player facade over the native and adaptive Android engines

pub mod config;
mod heartbeat;
pub mod player;

pub use config::PlayerConfig;
pub use player::{Backend, Player, PlayerBuilder};

pub use twinplay_core::*;
pub use twinplay_engine::{
    AdaptiveEngine, AdaptiveEngineFactory, AdaptiveEngineListener, Engine, MediaSource,
    MediaSourceFactory, NativeEngine, NativeEngineFactory, NativeEngineListener, SourceKind,
    VideoFormat,
};

#[cfg(feature = "testing")]
pub use twinplay_backend::testing;

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Install the platform logger. Safe to call repeatedly; the first call wins.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        #[cfg(target_os = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(log::LevelFilter::Debug)
                    .with_tag("Twinplay"),
            );
        }

        #[cfg(not(target_os = "android"))]
        {
            let _ = env_logger::builder()
                .is_test(cfg!(test))
                .filter_level(log::LevelFilter::Info)
                .try_init();
        }

        log::info!("Twinplay logging initialized");
    });
}
