use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use bptc_compression::{
    decode::decompress_blocks_rgba8, encode::compress_rgba8, BC6HSettings, BC7Settings, BlockFormat,
    CompressionVariant,
};
use ddsfile::{AlphaMode, D3D10ResourceDimension, Dds, DxgiFormat, NewDxgiParams};
use image::{ExtendedColorType, ImageReader, RgbaImage};

enum Command {
    Compress(CompressionVariant, String),
    Decompress(String),
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(command) = parse_args() else {
        return ExitCode::FAILURE;
    };

    let result = match command {
        Command::Compress(variant, file_name) => compress_file(variant, &file_name),
        Command::Decompress(file_name) => decompress_file(&file_name),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{message}");
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn compress_file(variant: CompressionVariant, file_name: &str) -> Result<(), String> {
    let start = Instant::now();

    let image = ImageReader::open(file_name)
        .map_err(|error| format!("can't open input image: {error}"))?
        .decode()
        .map_err(|error| format!("can't decode image: {error}"))?;
    let image = pad_to_blocks(image.to_rgba8());
    let (width, height) = image.dimensions();

    println!("Image read took: {:.3} ms", start.elapsed().as_secs_f64() * 1000.0);

    let start = Instant::now();

    let mut blocks = vec![0; variant.blocks_byte_size(width, height)];
    compress_rgba8(variant, image.as_raw(), &mut blocks, width, height, width * 4);

    println!(
        "Compression to {variant} took: {:.3} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let start = Instant::now();

    write_dds_file(file_name, variant.format(), width, height, blocks)?;

    println!("DDS output to disk took: {:.3} ms", start.elapsed().as_secs_f64() * 1000.0);

    Ok(())
}

fn decompress_file(file_name: &str) -> Result<(), String> {
    let start = Instant::now();

    let file = File::open(file_name).map_err(|error| format!("can't open {file_name}: {error}"))?;
    let dds = Dds::read(&mut BufReader::new(file))
        .map_err(|error| format!("can't read DDS file: {error}"))?;

    let format = match dds.get_dxgi_format() {
        Some(DxgiFormat::BC6H_UF16) => BlockFormat::Bc6hUnsigned,
        Some(DxgiFormat::BC6H_SF16) => BlockFormat::Bc6hSigned,
        Some(DxgiFormat::BC7_UNorm | DxgiFormat::BC7_UNorm_sRGB | DxgiFormat::BC7_Typeless) => {
            BlockFormat::Bc7
        }
        other => return Err(format!("unsupported DDS format {other:?}")),
    };
    let (width, height) = (dds.get_width(), dds.get_height());

    // Only the first mip level of the first layer is decoded.
    let size = format.blocks_byte_size(width, height);
    let blocks = dds
        .data
        .get(..size)
        .ok_or_else(|| {
            format!("DDS data holds {} bytes, expected at least {size}", dds.data.len())
        })?;

    let mut pixels = vec![0; width as usize * height as usize * 4];
    decompress_blocks_rgba8(format, width, height, blocks, &mut pixels)
        .map_err(|error| error.to_string())?;

    println!(
        "Decompression of {format:?} took: {:.3} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut png_name = PathBuf::from(file_name);
    png_name.set_extension("png");
    image::save_buffer(&png_name, &pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|error| format!("can't write {}: {error}", png_name.display()))?;

    Ok(())
}

/// Extends the image to whole blocks by repeating its last column and row.
fn pad_to_blocks(image: RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let padded_width = (width + 3) & !3;
    let padded_height = (height + 3) & !3;

    if (padded_width, padded_height) == (width, height) || width == 0 || height == 0 {
        return image;
    }

    log::info!("padding {width}x{height} image to {padded_width}x{padded_height}");

    RgbaImage::from_fn(padded_width, padded_height, |x, y| {
        *image.get_pixel(x.min(width - 1), y.min(height - 1))
    })
}

fn write_dds_file(
    file_name: &str,
    format: BlockFormat,
    width: u32,
    height: u32,
    block_data: Vec<u8>,
) -> Result<(), String> {
    let mut dds = Dds::new_dxgi(NewDxgiParams {
        height,
        width,
        depth: None,
        format: dxgi_format(format),
        mipmap_levels: Some(1),
        array_layers: None,
        caps2: None,
        is_cubemap: false,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode: AlphaMode::Straight,
    })
    .map_err(|error| format!("failed to create DDS header: {error}"))?;

    dds.data = block_data;

    let mut dds_name = PathBuf::from(file_name);
    dds_name.set_extension("dds");

    let mut file = File::create(&dds_name)
        .map_err(|error| format!("failed to create output file: {error}"))?;
    dds.write(&mut file)
        .map_err(|error| format!("failed to write DDS file: {error}"))?;

    log::info!("wrote {}", dds_name.display());

    Ok(())
}

fn dxgi_format(format: BlockFormat) -> DxgiFormat {
    match format {
        BlockFormat::Bc6hUnsigned => DxgiFormat::BC6H_UF16,
        BlockFormat::Bc6hSigned => DxgiFormat::BC6H_SF16,
        BlockFormat::Bc7 => DxgiFormat::BC7_UNorm,
    }
}

fn print_help() {
    println!("Usage: compressor <compression_variant> <input_file>");
    println!("\nCompression variants:");
    println!("  bc6h        - BC6H compression (RGB HDR, unsigned)");
    println!("  bc6h-signed - BC6H compression (RGB HDR, signed)");
    println!("  bc7         - BC7 compression with smooth alpha (RGBA)");
    println!("  bc7-opaque  - BC7 compression, alpha is dropped (RGB)");
    println!("\nThe DDS file is written next to the input. A DDS input is decoded to PNG instead,");
    println!("its block format is taken from the DDS header.");
}

fn parse_args() -> Option<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 3 || args.iter().any(|arg| arg == "--help") {
        print_help();
        return None;
    }

    let file_name = args[2].clone();

    if Path::new(&file_name).extension().is_some_and(|ext| ext.eq_ignore_ascii_case("dds")) {
        return Some(Command::Decompress(file_name));
    }

    let variant = match args[1].to_lowercase().as_str() {
        "bc6h" => CompressionVariant::BC6H(BC6HSettings::very_slow()),
        "bc6h-signed" => CompressionVariant::BC6HSigned(BC6HSettings::very_slow()),
        "bc7" => CompressionVariant::BC7(BC7Settings::alpha_slow()),
        "bc7-opaque" => CompressionVariant::BC7(BC7Settings::opaque_slow()),
        _ => {
            println!("Error: Invalid compression variant");
            print_help();
            return None;
        }
    };

    Some(Command::Compress(variant, file_name))
}
