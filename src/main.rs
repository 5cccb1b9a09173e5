use std::process::ExitCode;

use clap::{Parser, Subcommand};

use daybyday_lib::config::AppConfig;
use daybyday_lib::logging::init_logging;
use daybyday_lib::preferences::ThemeMode;
use daybyday_lib::stats::completion_color;
use daybyday_lib::{AppState, Commands, FileStorage, MonthCalendar, Recurrence, Task, View, YearMonth};

#[derive(Debug, Parser)]
#[command(name = "daybyday", version, about = "Daily tasks and a completion calendar")]
struct Cli {
    /// Directory holding the task collection and preferences
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a task dated today
    Add {
        text: Vec<String>,
        /// Recurrence label: daily, weekly, monthly or yearly
        #[arg(long, short, default_value = "none")]
        repeat: Recurrence,
    },
    /// Flip a task between open and done
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Tasks dated today
    Today,
    /// Tasks carrying a recurrence label
    Recurring,
    /// Open tasks from earlier days
    Missed,
    /// Completion percentage of today's tasks
    Progress,
    /// Completion calendar for a month (defaults to the current one)
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Show or set the theme preference
    Theme { mode: Option<ThemeMode> },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let _logger = match init_logging(&config.data_dir, &config.log_spec) {
        Ok(handle) => Some(handle),
        Err(error) => {
            eprintln!("logger init failed: {error}");
            None
        }
    };

    let storage = FileStorage::new(config.data_dir.clone());
    if let Err(error) = storage.ensure_dirs() {
        eprintln!("cannot prepare {}: {error}", config.data_dir.display());
        return ExitCode::FAILURE;
    }

    let commands = Commands::new(storage, AppState::default(), config.app_version.clone());
    match run(&commands, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("command failed: {message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(commands: &Commands<FileStorage>, command: Command) -> Result<(), String> {
    if commands.begin_session().await {
        println!("Welcome to DayByDay! Add a task with `daybyday add <text>`.");
    }

    match command {
        Command::Add { text, repeat } => {
            let task = commands.create_task(&text.join(" "), repeat).await.into_result()?;
            println!("added {}", task.id);
        }
        Command::Toggle { id } => {
            if !commands.toggle_task(&id).await.into_result()? {
                println!("no task {id}");
            }
        }
        Command::Delete { id } => {
            if !commands.delete_task(&id).await.into_result()? {
                println!("no task {id}");
            }
        }
        Command::Today => print_view(commands, View::Today).await?,
        Command::Recurring => print_view(commands, View::Recurring).await?,
        Command::Missed => print_view(commands, View::Missed).await?,
        Command::Progress => {
            commands.refresh().await.into_result()?;
            println!("{}%", commands.daily_progress());
        }
        Command::Month { year, month } => {
            let current = YearMonth::containing(commands.today());
            let target = YearMonth::new(
                year.unwrap_or_else(|| current.year()),
                month.unwrap_or_else(|| current.month()),
            )
            .ok_or_else(|| "month must be between 1 and 12".to_string())?;
            commands.refresh().await.into_result()?;
            print_month(target, &commands.month(target));
        }
        Command::Theme { mode } => match mode {
            Some(mode) => {
                commands.set_theme(mode).await.into_result()?;
                println!("theme set to {mode}");
            }
            None => println!("{}", commands.state().theme()),
        },
    }
    Ok(())
}

async fn print_view(commands: &Commands<FileStorage>, view: View) -> Result<(), String> {
    commands.refresh().await.into_result()?;
    let tasks = commands.view(view);
    println!("{view}");
    if tasks.is_empty() {
        println!("    (none)");
    }
    for task in &tasks {
        print_task(task);
    }
    Ok(())
}

fn print_task(task: &Task) {
    let completion = if task.completed { "✓" } else { " " };
    let repeat = if task.is_recurring() {
        format!(" ({})", task.recurring)
    } else {
        String::new()
    };
    println!("    [{completion}] {}{repeat}\t{}\t{}", task.text, task.date, task.id);
}

fn print_month(target: YearMonth, calendar: &MonthCalendar) {
    println!("{target}");
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    let mut line = "    ".repeat(calendar.first_weekday as usize);
    for (index, day) in calendar.days.iter().enumerate() {
        let marker = match (day.stats.completed, day.stats.total) {
            (_, 0) => ' ',
            (done, total) if done == total => '+',
            _ => '-',
        };
        let cell = format!("{:>2}{marker} ", index + 1);
        line.push_str(&cell);
        if (calendar.first_weekday as usize + index + 1) % 7 == 0 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }
    for day in calendar.days.iter().filter(|day| day.stats.total > 0) {
        println!(
            "{}  {}/{}  {}",
            day.date,
            day.stats.completed,
            day.stats.total,
            completion_color(day.stats)
        );
    }
}
