use std::path::PathBuf;

use kelas::prelude::*;
use kelas_widgets::{BatteryReading, Chart, format_server_time};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

const HELP: &str = "\
perintah:
  login <username> <password>   masuk
  logout [batal]                keluar (\"batal\" menjawab tidak)
  chat <pesan>                  tanya AI Assistant
  theme                         ganti tema terang/gelap
  dismiss <n>                   tutup notifikasi #n
  visit <halaman>               buka halaman, mis. profile.html
  move                          aktivitas (gerak mouse/tombol)
  password <baru> [konfirmasi]  cek kekuatan password
  charts                        data grafik dashboard
  date                          tanggal dan jam server
  quit                          tutup tab";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Event(PageEvent),
    Password { new: String, confirm: String },
    Charts,
    Date,
    Help,
    Unknown(String),
    Empty,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match word {
        "" => Command::Empty,
        "login" => {
            let (username, password) = rest.split_once(' ').unwrap_or((rest, ""));
            Command::Event(PageEvent::Login(Credentials::new(username, password.trim())))
        }
        "logout" => Command::Event(PageEvent::Logout {
            confirmed: rest != "batal",
        }),
        "chat" => Command::Event(PageEvent::Chat(rest.to_string())),
        "theme" => Command::Event(PageEvent::ToggleTheme),
        "dismiss" => match rest.trim_start_matches('#').parse() {
            Ok(n) => Command::Event(PageEvent::Dismiss(NoticeId(n))),
            Err(_) => Command::Unknown(line.to_string()),
        },
        "visit" => Command::Event(PageEvent::Visit(Page::from_path(rest))),
        "move" => Command::Event(PageEvent::Activity),
        "password" => {
            let (new, confirm) = rest.split_once(' ').unwrap_or((rest, ""));
            Command::Password {
                new: new.to_string(),
                confirm: confirm.trim().to_string(),
            }
        }
        "charts" => Command::Charts,
        "date" => Command::Date,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Event(PageEvent::Shutdown),
        _ => Command::Unknown(line.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn battery_line(battery: &BatteryReading) -> String {
    format!(
        "baterai {} ({}, sisa {})",
        battery.percent_text(),
        battery.status.label(),
        battery.time_left
    )
}

fn render(output: &PageOutput) -> String {
    match output {
        PageOutput::Navigated(page) => format!("== {page} =="),
        PageOutput::Notice { id, notice } => {
            format!("[{id}] ({}) {}", notice.kind.icon(), notice.message)
        }
        PageOutput::NoticeDismissed(id) => format!("[{id}] ditutup"),
        PageOutput::Identity(user) => format!(
            "masuk sebagai {} <{}>, kelas {}, {}",
            user.full_name, user.email, user.class, user.location
        ),
        PageOutput::LoginRejected(message) => format!("! {message}"),
        PageOutput::ChatSent(message) => format!("anda [{}]: {}", message.time, message.text),
        PageOutput::ChatReply(message) => format!("AI [{}]: {}", message.time, message.text),
        PageOutput::Telemetry(update) => render_telemetry(update),
        PageOutput::Theme(theme) => format!("tema: {theme}"),
    }
}

fn render_telemetry(update: &TelemetryUpdate) -> String {
    match update {
        TelemetryUpdate::Clock { server_time, uptime, .. } => {
            format!("jam {server_time} | uptime {uptime}")
        }
        TelemetryUpdate::Battery(battery) => battery_line(battery),
        TelemetryUpdate::Stats(stats) => format!(
            "online {} | respons {} ms | ping {} ms | {} Mbps",
            stats.online_users, stats.response_ms, stats.ping_ms, stats.speed_mbps
        ),
        TelemetryUpdate::Network { ip, location } => format!("ip {ip} ({location})"),
    }
}

fn render_chart(chart: &Chart) -> String {
    let points: Vec<String> = chart
        .labels
        .iter()
        .zip(&chart.dataset.values)
        .map(|(label, value)| format!("{label}={value}"))
        .collect();
    format!("{} ({:?}): {}", chart.id, chart.kind, points.join(", "))
}

fn run_local(command: Command) {
    match command {
        Command::Password { new, confirm } => {
            let check = check_strength(&new);
            println!("kekuatan {}/5: {:?}", check.strength(), check.level);
            let matched = check_match(&new, &confirm);
            if matched != PasswordMatch::Empty {
                println!("{}", matched.message());
            }
        }
        Command::Charts => {
            for chart in all_charts() {
                println!("{}", render_chart(&chart));
            }
        }
        Command::Date => {
            let now = chrono::Local::now();
            println!("{} {}", format_long_date(&now), format_server_time(&now));
        }
        Command::Help => println!("{HELP}"),
        Command::Unknown(line) => println!("? {line:?} (ketik help)"),
        Command::Empty | Command::Event(_) => {}
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn host_device() -> DeviceInfo {
    DeviceInfo {
        browser: format!("student-portal/{}", env!("CARGO_PKG_VERSION")),
        platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        language: std::env::var("LANG").unwrap_or_else(|_| "id-ID".to_string()),
        screen: "80x24".to_string(),
        cores: std::thread::available_parallelism().ok().map(|n| n.get()),
    }
}

fn load_config() -> Result<PortalConfig, PortalError> {
    let mut config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => PortalConfig::from_json_file(path)?,
        None => PortalConfig::default(),
    };
    if let Ok(policy) = std::env::var("KELAS_TELEMETRY_POLICY") {
        config.telemetry.policy = policy.parse::<TickPolicy>()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), PortalError> {
    init_tracing();

    let config = load_config()?;
    let mut portal = PortalBuilder::new()
        .config(config)
        .build(SimulatedAuthenticator::new(host_device()))?;

    for output in portal.load(Page::new(INDEX)) {
        println!("{}", render(&output));
    }
    println!("ketik help untuk daftar perintah");

    let (events_tx, events_rx) = mpsc::channel(32);
    let (outputs_tx, mut outputs_rx) = mpsc::unbounded_channel();
    let portal_task = tokio::spawn(portal.run(events_rx, outputs_tx));

    let printer = tokio::spawn(async move {
        while let Some(output) = outputs_rx.recv().await {
            println!("{}", render(&output));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Event(event) => {
                let shutdown = event == PageEvent::Shutdown;
                if events_tx.send(event).await.is_err() || shutdown {
                    break;
                }
            }
            local => run_local(local),
        }
    }

    // stdin closed or quit: close the tab.
    let _ = events_tx.send(PageEvent::Shutdown).await;
    drop(events_tx);

    match portal_task.await {
        Ok(portal) => tracing::info!(page = %portal.page(), "tab closed"),
        Err(e) => tracing::error!(error = %e, "portal task failed"),
    }
    let _ = printer.await;
    Ok(())
}
