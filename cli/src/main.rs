//! dspplot CLI
//!
//! Command-line front end for the dspplot library. Loads a signal, builds a
//! response or spectrogram plan and writes it as JSON for a renderer, or
//! rasterises spectrograms to PNG directly.

use std::fs;
use std::path::Path;
use std::process;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dspplot_lib::{
    audio_io::{tone, write_signal_file},
    colormap::ColormapRegistry,
    response::{plan, PanelKind, PlotConfig, PlotPlan},
    spectrum::PhaseWindow,
    ticks::TickSet,
    utils::{self, format_duration, format_frequency},
    PhaseArg, PlotError, SignalInput,
};

#[cfg(feature = "image")]
use dspplot_lib::spectrogram::image::{save_spectrogram, SpectrogramImageOptions};

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn build_cli() -> Command {
    Command::new("dspplot")
        .version(dspplot_lib::VERSION)
        .about("Frequency response and spectrogram plot data from audio signals")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON file with plot options; flags override its values")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .help("Plot title")
                .value_name("TEXT")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Write the plot plan to this file instead of stdout")
                .value_name("FILE")
                .global(true),
        )
        .subcommand(
            Command::new("response")
                .about("Amplitude, magnitude and phase response of a signal")
                .arg(
                    Arg::new("file")
                        .help("Audio file to analyze")
                        .value_name("FILE")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("pad-width")
                        .long("pad-width")
                        .short('p')
                        .help("Transform length; shorter signals are zero-padded")
                        .value_name("N")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("strict-pad")
                        .long("strict-pad")
                        .help("Fail instead of growing the pad width to the signal length")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("log-freq")
                        .long("log-freq")
                        .help("Logarithmic frequency axis with decade ticks")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("normalized-freq")
                        .long("normalized-freq")
                        .help("Frequency axis as a fraction of Nyquist")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("phase")
                        .long("phase")
                        .help("Add a phase response panel")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-freq")
                        .long("no-freq")
                        .help("Omit the magnitude response panel")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("phase-arg")
                        .long("phase-arg")
                        .help("Remove the linear phase of this sample position, or 'auto' for the block center")
                        .value_name("SAMPLE|auto"),
                )
                .arg(
                    Arg::new("wide-phase")
                        .long("wide-phase")
                        .help("Show phase over [-190, 190] degrees")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("divide-by-length")
                        .long("divide-by-length")
                        .help("Scale the spectrum by 1 / signal length")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("freq-tick")
                        .long("freq-tick")
                        .help("Extra frequency tick in Hz (repeatable)")
                        .value_name("HZ")
                        .value_parser(value_parser!(f64))
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("vertical")
                        .long("vertical")
                        .help("Place panels side by side")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("dots")
                        .long("dots")
                        .help("Mark every sample in the amplitude panel")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("spectrogram")
                .about("Time-frequency image of a signal")
                .arg(
                    Arg::new("file")
                        .help("Audio file to analyze")
                        .value_name("FILE")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("segment-size")
                        .long("segment-size")
                        .short('s')
                        .help("Segment size in samples")
                        .value_name("SIZE")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("overlap")
                        .long("overlap")
                        .short('o')
                        .help("Window length in segments")
                        .value_name("FACTOR")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("vmin")
                        .long("vmin")
                        .help("Lower display bound in dB")
                        .value_name("DB")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("vmax")
                        .long("vmax")
                        .help("Upper display bound in dB")
                        .value_name("DB")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("normalize")
                        .long("normalize")
                        .help("Rescale the signal to unit peak first")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("png")
                        .long("png")
                        .help("Render the spectrogram to this PNG file")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("width")
                        .long("width")
                        .help("PNG width in pixels")
                        .value_name("PX")
                        .default_value("1000")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .help("PNG height in pixels")
                        .value_name("PX")
                        .default_value("600")
                        .value_parser(value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("tone")
                .about("Write a sine test tone as a 32-bit float WAV file")
                .arg(
                    Arg::new("output")
                        .help("Output WAV file")
                        .value_name("FILE")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("freq")
                        .long("freq")
                        .short('f')
                        .help("Tone frequency in Hz")
                        .value_name("HZ")
                        .default_value("1000")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("rate")
                        .long("rate")
                        .short('r')
                        .help("Sample rate in Hz")
                        .value_name("HZ")
                        .default_value("48000")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("seconds")
                        .long("seconds")
                        .help("Duration in seconds")
                        .value_name("S")
                        .default_value("1.0")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("amplitude")
                        .long("amplitude")
                        .help("Peak amplitude")
                        .value_name("A")
                        .default_value("0.5")
                        .value_parser(value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("ticks")
                .about("Print logarithmic frequency ticks and labels")
                .arg(
                    Arg::new("stop")
                        .help("Last tick, usually the Nyquist frequency")
                        .value_name("HZ")
                        .required(true)
                        .index(1)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .help("First decade in Hz")
                        .value_name("HZ")
                        .default_value("10")
                        .value_parser(value_parser!(f64)),
                ),
        )
}

/// Config file (if any) with the global flags applied
fn base_config(matches: &ArgMatches) -> CliResult<PlotConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let config: PlotConfig = serde_json::from_str(&text)?;
            log::info!("Loaded plot options from {}", path);
            config
        }
        None => PlotConfig::default(),
    };

    if let Some(title) = matches.get_one::<String>("title") {
        config.title = title.clone();
    }
    Ok(config)
}

fn apply_response_flags(config: &mut PlotConfig, matches: &ArgMatches) -> CliResult<()> {
    config.spectrogram = false;

    if let Some(&pad_width) = matches.get_one::<usize>("pad-width") {
        config.pad_width = pad_width;
    }
    if matches.get_flag("strict-pad") {
        config.fit_pad_width = false;
    }
    if matches.get_flag("log-freq") {
        config.log_freq = true;
    }
    if matches.get_flag("normalized-freq") {
        config.normalized_freq = true;
    }
    if matches.get_flag("phase") {
        config.phase_response = true;
    }
    if matches.get_flag("no-freq") {
        config.freq_response = false;
    }
    if let Some(arg) = matches.get_one::<String>("phase-arg") {
        config.phase_arg = Some(arg.parse::<PhaseArg>()?);
    }
    if matches.get_flag("wide-phase") {
        config.phase_window = PhaseWindow::Wide;
    }
    if matches.get_flag("divide-by-length") {
        config.divide_by_length = true;
    }
    if let Some(ticks) = matches.get_many::<f64>("freq-tick") {
        config.freq_ticks.extend(ticks.copied());
    }
    if matches.get_flag("vertical") {
        config.horizontal = false;
    }
    if matches.get_flag("dots") {
        config.dots = true;
    }
    Ok(())
}

fn apply_spectrogram_flags(config: &mut PlotConfig, matches: &ArgMatches) {
    config.spectrogram = true;

    if let Some(&segment_size) = matches.get_one::<usize>("segment-size") {
        config.segment_size = segment_size;
    }
    if let Some(&overlap) = matches.get_one::<usize>("overlap") {
        config.overlap = overlap;
    }
    if let Some(&vmin) = matches.get_one::<f64>("vmin") {
        config.vmin = vmin;
    }
    if let Some(&vmax) = matches.get_one::<f64>("vmax") {
        config.vmax = vmax;
    }
    if matches.get_flag("normalize") {
        config.normalize = true;
    }
}

fn write_plan(plot: &PlotPlan, matches: &ArgMatches) -> CliResult<()> {
    let json = serde_json::to_string_pretty(plot)?;
    match matches.get_one::<String>("json") {
        Some(path) => {
            fs::write(path, json)?;
            println!("Plot plan written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn load_input(path: &str) -> CliResult<SignalInput> {
    let signal = utils::load_signal(path)?;
    eprintln!(
        "Loaded {}: {} samples at {} Hz ({})",
        path,
        signal.len(),
        signal.sample_rate(),
        format_duration(signal.len(), signal.sample_rate())
    );
    Ok(SignalInput::SignalSource(signal))
}

fn run_response(matches: &ArgMatches, sub: &ArgMatches) -> CliResult<()> {
    let mut config = base_config(matches)?;
    apply_response_flags(&mut config, sub)?;

    let input = load_input(required(sub, "file")?)?;
    let mut registry = ColormapRegistry::with_builtins();
    let plot = plan(input, &config, &mut registry)?;

    if let PlotPlan::Response(response) = &plot {
        if let Some(panel) = response.panel(PanelKind::Magnitude) {
            let peak = panel
                .y
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1));
            if let Some((bin, db)) = peak {
                let freq = if config.normalized_freq {
                    format!("{:.4} x Nyquist", panel.x[bin])
                } else {
                    format_frequency(panel.x[bin])
                };
                eprintln!("Magnitude peak: {:.2} dB at {}", db, freq);
            }
        }
    }

    write_plan(&plot, matches)
}

fn run_spectrogram(matches: &ArgMatches, sub: &ArgMatches) -> CliResult<()> {
    let mut config = base_config(matches)?;
    apply_spectrogram_flags(&mut config, sub);

    let input = load_input(required(sub, "file")?)?;
    let mut registry = ColormapRegistry::with_builtins();
    let plot = plan(input, &config, &mut registry)?;

    if let PlotPlan::Spectrogram(spectrogram) = &plot {
        let (rows, columns) = spectrogram.spectrogram.shape();
        eprintln!("Spectrogram: {} frequency rows x {} segments", rows, columns);

        if let Some(png) = sub.get_one::<String>("png") {
            render_png(spectrogram, png, sub)?;
        }
    }

    if sub.get_one::<String>("png").is_none() || matches.get_one::<String>("json").is_some() {
        write_plan(&plot, matches)?;
    }
    Ok(())
}

#[cfg(feature = "image")]
fn render_png(
    plot: &dspplot_lib::response::SpectrogramPlan,
    path: &str,
    sub: &ArgMatches,
) -> CliResult<()> {
    let options = SpectrogramImageOptions {
        width: sub.get_one::<u32>("width").copied(),
        height: sub.get_one::<u32>("height").copied(),
        ..Default::default()
    };
    save_spectrogram(&plot.spectrogram, &plot.colormap, Path::new(path), &options)?;
    println!("Spectrogram image written to {}", path);
    Ok(())
}

#[cfg(not(feature = "image"))]
fn render_png(
    _plot: &dspplot_lib::response::SpectrogramPlan,
    _path: &str,
    _sub: &ArgMatches,
) -> CliResult<()> {
    Err("PNG output requires the 'image' feature".into())
}

fn run_tone(sub: &ArgMatches) -> CliResult<()> {
    let output = required(sub, "output")?;
    let frequency = *sub.get_one::<f64>("freq").ok_or("missing --freq")?;
    let rate = *sub.get_one::<u32>("rate").ok_or("missing --rate")?;
    let seconds = *sub.get_one::<f64>("seconds").ok_or("missing --seconds")?;
    let amplitude = *sub.get_one::<f64>("amplitude").ok_or("missing --amplitude")?;

    if rate == 0 {
        return Err(PlotError::InvalidConfiguration("Sample rate must be positive".into()).into());
    }

    let signal = tone(frequency, rate, seconds, amplitude);
    write_signal_file(Path::new(output), &signal)?;
    println!(
        "Wrote {} tone at {} Hz, {} to {}",
        format_frequency(frequency),
        rate,
        format_duration(signal.len(), rate),
        output
    );
    Ok(())
}

fn run_ticks(sub: &ArgMatches) -> CliResult<()> {
    let stop = *sub.get_one::<f64>("stop").ok_or("missing stop frequency")?;
    let start = *sub.get_one::<f64>("start").ok_or("missing --start")?;

    for tick in &TickSet::decades(start, stop)? {
        println!("{:>10} {}", tick.position, tick.label);
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> CliResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument <{}>", name).into())
}

fn main() {
    dspplot_lib::init();

    let matches = build_cli().get_matches();

    let result = match matches.subcommand() {
        Some(("response", sub)) => run_response(&matches, sub),
        Some(("spectrogram", sub)) => run_spectrogram(&matches, sub),
        Some(("tone", sub)) => run_tone(sub),
        Some(("ticks", sub)) => run_ticks(sub),
        _ => Err("unknown command".into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
