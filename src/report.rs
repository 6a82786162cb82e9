use adsbot::{Arg, RunReport};

/// What a piece of report text is; each role maps to one SGR sequence.
#[derive(Clone, Copy)]
enum Role {
    Heading,
    Section,
    Platform,
    Verb,
    Value,
    Timing,
    Failure,
    Muted,
}

impl Role {
    fn sgr(self) -> &'static str {
        match self {
            Role::Heading => "1;36",
            Role::Section => "90",
            Role::Platform => "34",
            Role::Verb => "1;32",
            Role::Value => "33",
            Role::Timing => "32",
            Role::Failure => "1;31",
            Role::Muted => "2",
        }
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn paint(&self, s: impl AsRef<str>, role: Role) -> String {
        if self.enabled { format!("\x1b[{}m{}\x1b[0m", role.sgr(), s.as_ref()) } else { s.as_ref().to_string() }
    }

    fn section(&self, title: &str) -> String {
        self.paint(format!("━━━ {title} ━━━"), Role::Section)
    }
}

pub fn print_run(report: &RunReport, color: bool) {
    let palette = Palette { enabled: color };
    println!("\n{}", palette.paint(format!("⚙  Command: \"{}\"", report.text.trim()), Role::Heading));

    println!("\n{}", palette.section("Parsed"));
    match &report.parsed {
        Some(parsed) => {
            println!(
                "  {} {} {} {}",
                palette.paint(parsed.platform.name(), Role::Platform),
                palette.paint(parsed.command.name(), Role::Verb),
                palette.paint("│ grammar:", Role::Muted),
                parsed.grammar,
            );
            for (name, value) in parsed.args.iter() {
                println!("      {} {}", palette.paint(format!("{name}:"), Role::Muted), fmt_arg(value, &palette));
            }
        }
        None => println!("{}", palette.paint("  Not resolved", Role::Muted)),
    }

    println!("\n{}", palette.section("Response"));
    print_chunks(&report.response.body, &palette);

    if !report.response.errors.is_empty() {
        println!("\n{}", palette.section("Errors"));
        print_chunks(&report.response.errors, &palette);
    }

    if let Some(kind) = report.failure {
        println!("\n{}", palette.paint(format!("Failed: {kind}"), Role::Failure));
    }

    let m = &report.metrics;
    let stages = [
        ("Total", m.total),
        ("Match", m.matching),
        ("Resolve", m.resolve),
        ("Execute", m.execute),
        ("Format", m.format),
        ("Other", m.overhead()),
    ];
    let timings: Vec<String> =
        stages.iter().map(|(stage, took)| format!("{stage}: {}", palette.paint(format!("{took:?}"), Role::Timing))).collect();
    println!("\n{}", palette.section("Timing"));
    println!("  {}", timings.join("  │  "));
    println!();
}

fn print_chunks(chunks: &[String], palette: &Palette) {
    for (idx, chunk) in chunks.iter().enumerate() {
        println!("  {}", palette.paint(format!("[{idx}] {} chars", chunk.chars().count()), Role::Muted));
        for line in chunk.lines() {
            println!("      {line}");
        }
    }
}

fn fmt_arg(value: &Arg, palette: &Palette) -> String {
    match value {
        Arg::None => palette.paint("(all)", Role::Muted),
        Arg::Switch => palette.paint("on", Role::Value),
        other => palette.paint(other.to_string(), Role::Value),
    }
}
