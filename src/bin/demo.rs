use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stdui::{Color, PollStatus, Pose, Position, StduiConfig, Surface};

#[derive(Parser, Debug)]
#[command(name = "stdui-demo", version, about = "Draws shapes, text and widgets with stdui")]
struct Cli {
    /// TrueType font used for all text
    #[arg(long, short, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Image drawn in the lower right corner
    #[arg(long, short, value_name = "PATH")]
    image: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "stdui demo")]
    title: String,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Quit after this many frames instead of waiting for Escape
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
}

fn load_config(cli: &Cli) -> anyhow::Result<StduiConfig> {
    let mut config = match &cli.config {
        Some(path) => StduiConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => StduiConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(font) = &cli.font {
        config.font_path = Some(font.clone());
    }
    Ok(config.validated()?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("stdui-demo: {e:#}");
            return ExitCode::from(1);
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    let mut surface = match Surface::open(config) {
        Ok(surface) => surface,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::from(1);
        }
    };
    if let Err(e) = surface.create_window(&cli.title, 100, 100, cli.width, cli.height) {
        log::error!("{e}");
        surface.close();
        return ExitCode::from(1);
    }

    run(&mut surface, &cli);
    surface.close();
    ExitCode::SUCCESS
}

#[cfg(feature = "widgets")]
struct Widgets {
    button: stdui::widgets::Button,
    slider: stdui::widgets::Slider,
    toggle: stdui::widgets::Toggle,
    progress: stdui::widgets::ProgressBar,
    menu: stdui::widgets::MenuBar,
    field: stdui::widgets::TextField,
}

#[cfg(feature = "widgets")]
impl Widgets {
    fn new(width: f32) -> Self {
        use stdui::widgets::*;
        Self {
            button: Button::new(120.0, 80.0, 160.0, 40.0, "Click me")
                .with_callback(|| log::info!("button clicked")),
            slider: Slider::new(120.0, 140.0, 200.0, 20.0, 0.0, 100.0, 40.0),
            toggle: Toggle::new(40.0, 190.0, 24.0, 24.0, "Option", true),
            progress: ProgressBar::new(120.0, 240.0, 200.0, 24.0, 0.0, 100.0, 40.0),
            menu: MenuBar::new(width / 2.0, 12.0, width, 24.0)
                .with_item(
                    MenuItem::new("File")
                        .with_sub_item(MenuItem::new("Quit").with_callback(|| log::info!("quit"))),
                )
                .with_item(MenuItem::new("Help").with_callback(|| log::info!("help"))),
            field: TextField::new(120.0, 300.0, 200.0, 30.0, 32),
        }
    }

    fn frame(&mut self, surface: &mut Surface) {
        let cursor = surface.cursor();
        let keys = surface.take_keys();
        self.button.update(&cursor);
        if self.slider.update(&cursor) {
            self.progress.set_value(self.slider.value());
        }
        self.toggle.update(&cursor);
        self.menu.update(&cursor);
        self.field.update(&cursor, &keys);

        if let Some(engine) = surface.engine_mut() {
            self.button.draw(engine);
            self.slider.draw(engine);
            self.toggle.draw(engine);
            self.progress.draw(engine);
            self.field.draw(engine);
            self.menu.draw(engine);
        }
    }
}

fn run(surface: &mut Surface, cli: &Cli) {
    #[cfg(feature = "widgets")]
    let mut widgets = Widgets::new(cli.width as f32);
    let hexagon: Vec<Position> = (0..6)
        .map(|i| {
            let a = (i as f32 * 60.0).to_radians();
            Position::new(0.5 * a.cos(), 0.5 * a.sin())
        })
        .collect();

    let mut frame: u64 = 0;
    while surface.poll_events() == PollStatus::Continue {
        if cli.frames.is_some_and(|limit| frame >= limit) {
            break;
        }
        surface.begin_frame();
        let (w, h) = surface
            .window()
            .map(|win| {
                let size = win.inner_size();
                (size.width as f32, size.height as f32)
            })
            .unwrap_or((cli.width as f32, cli.height as f32));

        surface.draw_rectangle(Pose::new(w / 2.0, h / 2.0, 40.0, 40.0, Color::RED));
        surface.draw_triangle(
            Pose::new(w - 120.0, 120.0, 80.0, 70.0, Color::ORANGE).rotated(frame as f32),
        );
        surface.draw_circle(Pose::new(w - 120.0, 260.0, 90.0, 90.0, Color::DODGER_BLUE));
        surface.draw_polygon(
            Pose::new(w - 240.0, 260.0, 80.0, 80.0, Color::SEA_GREEN),
            &hexagon,
        );
        surface.draw_text("stdui\nEscape quits", 20.0, h - 90.0, 1.0, Color::WHITE);
        if let Some(image) = &cli.image {
            surface.draw_image(image, 0.0, 0.0, w - 140.0, h - 140.0);
        }
        #[cfg(feature = "widgets")]
        widgets.frame(surface);

        if let Err(e) = surface.end_frame() {
            log::error!("present failed: {e}");
            break;
        }
        frame += 1;
    }
    log::info!("quit after {frame} frames");
}
