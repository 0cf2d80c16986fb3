//! # rasterbridge：命令行入口
//!
//! 用法：`rasterbridge <输入文件> <输出文件> [rgb|gray|mono]`
//!
//! 加载输入文件，按需保存调试快照，再以指定（或加载得到的）像素格式写出。
//! 输出级别取自环境变量 `RASTERBRIDGE_VERBOSITY`（如 `more`、`debug-save`、`4`）。

use std::env;
use std::process::ExitCode;

use rasterbridge::config::{self, Verbosity};
use rasterbridge::{PixelFormat, RasterError, load, save, snapshot};

const VERBOSITY_ENV: &str = "RASTERBRIDGE_VERBOSITY";
const DEBUG_TEMPLATE: &str = "rasterbridge-debug-%02d.pnm";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ [{}] {}", err.code(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), RasterError> {
    if let Ok(level) = env::var(VERBOSITY_ENV) {
        config::set_verbosity(Verbosity::from_str(&level)?);
    }

    let (input, output, format) = match args.as_slice() {
        [input, output] => (input, output, None),
        [input, output, format] => (input, output, Some(PixelFormat::from_str(format)?)),
        _ => {
            return Err(RasterError::InvalidSetting(
                "用法：rasterbridge <输入文件> <输出文件> [rgb|gray|mono]".to_string(),
            ));
        }
    };

    let frame = load(input)?;
    snapshot(DEBUG_TEMPLATE, 1, &frame)?;
    save(output, &frame, format.unwrap_or(frame.format()))?;
    Ok(())
}
