use std::path::Path;
use std::process::ExitCode;

use sparkfield::{App, SimulationError, Settings, SpriteTexture};

const DEFAULT_PRESET: &str = "JiggleZoom";

const USAGE: &str = "usage: sparkfield [PRESET | SETTINGS.json] [SEED] [SPRITE.png]";

fn load_settings(arg: &str) -> Result<Settings, SimulationError> {
    if Path::new(arg).is_file() {
        Ok(Settings::load(arg)?)
    } else {
        Ok(Settings::preset(arg)?)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let source = args.next().unwrap_or_else(|| DEFAULT_PRESET.to_string());
    if source == "-h" || source == "--help" {
        println!("{}", USAGE);
        println!("presets: {}", Settings::preset_names().join(", "));
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(&source) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(settings);
    if let Some(seed) = args.next() {
        match seed.parse::<u64>() {
            Ok(seed) => app = app.with_seed(seed),
            Err(_) => {
                log::error!("invalid seed '{}'", seed);
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(path) = args.next() {
        match SpriteTexture::from_file(&path) {
            Ok(sprite) => {
                log::info!("sprite {} ({}x{})", path, sprite.width, sprite.height);
                app = app.with_sprite(sprite);
            }
            Err(e) => {
                log::error!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    match sparkfield::run(app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
