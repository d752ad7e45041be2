//! Build script for framelink-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time
//! - Generates `device.rs` with the validated pipeline configuration

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest frame pool the core exchange accepts
const MAX_FRAMES: i64 = 3;

/// UART clock must run at least this many times the baud rate
const UART_OVERSAMPLING: i64 = 8;

/// Panel limits of the SSD1329 driver
const PANEL_WIDTH: i64 = 128;
const PANEL_HEIGHT: i64 = 96;

fn main() {
    setup_linker();
    let device = validate_device();
    generate_device(&device);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated contents of device.toml
struct Device {
    clock_hz: i64,
    baudrate: i64,
    data_bits: i64,
    parity: String,
    stop_bits: i64,
    width: i64,
    height: i64,
    bits_per_pixel: i64,
    bus_frequency_hz: i64,
    spi_mode: i64,
    word_width: i64,
    frame_count: i64,
}

impl Device {
    fn frame_len(&self) -> i64 {
        self.width * self.height * self.bits_per_pixel / 8
    }
}

/// Validate device.toml configuration at compile time
fn validate_device() -> Device {
    // Re-run if device.toml changes
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");

    // Check if config file exists
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: device.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a device.toml file describing the         ║\n\
            ║  serial link and the display panel.                              ║\n\
            ║  Please create one in the framelink-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the config file
    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read device.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in device.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    // Validate required sections exist
    validate_required_sections(&config);

    let mut errors = Vec::new();
    let device = Device {
        clock_hz: integer(&config, "system", "clock_hz", &mut errors),
        baudrate: integer(&config, "link", "baudrate", &mut errors),
        data_bits: integer(&config, "link", "data_bits", &mut errors),
        parity: string(&config, "link", "parity", &mut errors),
        stop_bits: integer(&config, "link", "stop_bits", &mut errors),
        width: integer(&config, "display", "width", &mut errors),
        height: integer(&config, "display", "height", &mut errors),
        bits_per_pixel: integer(&config, "display", "bits_per_pixel", &mut errors),
        bus_frequency_hz: integer(&config, "display", "bus_frequency_hz", &mut errors),
        spi_mode: integer(&config, "display", "spi_mode", &mut errors),
        word_width: integer(&config, "display", "word_width", &mut errors),
        frame_count: integer(&config, "display", "frame_count", &mut errors),
    };
    report("Missing or mistyped fields in device.toml", &errors);

    validate_link(&device);
    validate_display(&device);

    println!("cargo:warning=device.toml validated successfully");
    device
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a boxed list of errors, if there are any
fn report<S: AsRef<str>>(title: &str, errors: &[S]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let errors: Vec<String> = ["system", "link", "display"]
        .iter()
        .filter(|section| !matches!(config.get(**section), Some(toml::Value::Table(_))))
        .map(|section| format!("Missing [{}] section", section))
        .collect();

    report("Missing required sections in device.toml", &errors);
}

fn integer(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) => *value,
        Some(_) => {
            errors.push(format!("[{}] '{}' must be an integer", section, key));
            0
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            0
        }
    }
}

fn string(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> String {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(value)) => value.clone(),
        Some(_) => {
            errors.push(format!("[{}] '{}' must be a string", section, key));
            String::new()
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            String::new()
        }
    }
}

/// Validate serial link parameters
fn validate_link(device: &Device) {
    let mut errors = Vec::new();

    if device.clock_hz <= 0 || device.clock_hz > u32::MAX as i64 {
        errors.push("[system] clock_hz must be 1-4294967295".to_string());
    }
    if device.baudrate <= 0 {
        errors.push("[link] baudrate must be positive".to_string());
    } else if device.clock_hz < device.baudrate * UART_OVERSAMPLING {
        errors.push(format!(
            "[link] baudrate needs clock_hz >= {}",
            device.baudrate * UART_OVERSAMPLING
        ));
    }
    if !(5..=8).contains(&device.data_bits) {
        errors.push("[link] data_bits must be 5-8".to_string());
    }
    if !["none", "even", "odd"].contains(&device.parity.as_str()) {
        errors.push("[link] parity must be 'none', 'even', or 'odd'".to_string());
    }
    if !(1..=2).contains(&device.stop_bits) {
        errors.push("[link] stop_bits must be 1 or 2".to_string());
    }

    report("Invalid serial link configuration", &errors);
}

/// Validate panel geometry and display bus parameters
fn validate_display(device: &Device) {
    let mut errors = Vec::new();

    if device.bits_per_pixel != 4 {
        errors.push("[display] bits_per_pixel must be 4 (SSD1329)".to_string());
    }
    if device.width <= 0 || device.width > PANEL_WIDTH || device.width % 2 != 0 {
        errors.push(format!("[display] width must be even, 2-{}", PANEL_WIDTH));
    }
    if device.height <= 0 || device.height > PANEL_HEIGHT {
        errors.push(format!("[display] height must be 1-{}", PANEL_HEIGHT));
    }
    if device.bus_frequency_hz <= 0 || device.bus_frequency_hz > device.clock_hz / 2 {
        errors.push("[display] bus_frequency_hz must be 1 to clock_hz/2".to_string());
    }
    if !(0..=3).contains(&device.spi_mode) {
        errors.push("[display] spi_mode must be 0-3".to_string());
    }
    if device.word_width != 8 {
        errors.push("[display] word_width must be 8 on RP2040".to_string());
    }
    if !(1..=MAX_FRAMES).contains(&device.frame_count) {
        errors.push(format!("[display] frame_count must be 1-{}", MAX_FRAMES));
    }

    report("Invalid display configuration", &errors);
}

/// Write `device.rs` into OUT_DIR
fn generate_device(device: &Device) {
    let data_bits = match device.data_bits {
        5 => "Five",
        6 => "Six",
        7 => "Seven",
        _ => "Eight",
    };
    let parity = match device.parity.as_str() {
        "even" => "Even",
        "odd" => "Odd",
        _ => "None",
    };
    let stop_bits = if device.stop_bits == 2 { "Two" } else { "One" };
    let mode = format!("Mode{}", device.spi_mode);

    let source = format!(
        "// Generated by build.rs from device.toml\n\
        \n\
        use framelink_core::PipelineConfig;\n\
        use framelink_hal::spi::{{Mode, Role}};\n\
        use framelink_hal::uart::{{DataBits, Parity, StopBits}};\n\
        use framelink_hal::{{BusConfig, UartConfig}};\n\
        use framelink_protocol::FrameGeometry;\n\
        \n\
        pub const DEVICE: PipelineConfig = PipelineConfig {{\n\
        \x20   system_clock_hz: {clock},\n\
        \x20   link: UartConfig {{\n\
        \x20       baudrate: {baud},\n\
        \x20       data_bits: DataBits::{data_bits},\n\
        \x20       parity: Parity::{parity},\n\
        \x20       stop_bits: StopBits::{stop_bits},\n\
        \x20   }},\n\
        \x20   bus: BusConfig {{\n\
        \x20       bit_rate: {bus_hz},\n\
        \x20       mode: Mode::{mode},\n\
        \x20       role: Role::Master,\n\
        \x20       word_width: {word},\n\
        \x20   }},\n\
        \x20   geometry: FrameGeometry::new({width}, {height}, {bpp}),\n\
        \x20   frame_count: {count},\n\
        }};\n\
        \n\
        pub const FRAME_LEN: usize = {frame_len};\n\
        pub const FRAME_COUNT: usize = {count};\n",
        clock = device.clock_hz,
        baud = device.baudrate,
        bus_hz = device.bus_frequency_hz,
        word = device.word_width,
        width = device.width,
        height = device.height,
        bpp = device.bits_per_pixel,
        count = device.frame_count,
        frame_len = device.frame_len(),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("device.rs"), source).unwrap();
}
