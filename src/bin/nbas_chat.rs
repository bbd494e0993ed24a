use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use nbas_pipeline::{PipelineConfig, Session, SessionPaths};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    env_logger::init();

    let matches = Command::new("NBAS Chat")
        .version("0.1.0")
        .about("윈도우 기반 적응형 파이프라인 대화 도구")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("파이프라인 설정 JSON 파일"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .value_name("FILE")
                .help("모델 상태 파일")
                .default_value("model_state.bin"),
        )
        .arg(
            Arg::new("vocabulary")
                .long("vocabulary")
                .value_name("FILE")
                .help("어휘 파일")
                .default_value("vocabulary.txt"),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .value_name("FILE")
                .help("사용자 프로필 파일")
                .default_value("user_profile.txt"),
        )
        .arg(
            Arg::new("blocks")
                .long("blocks")
                .value_name("DIR")
                .help("밀려난 블록 보관 디렉토리 (기본: <state>.blocks)"),
        )
        .arg(
            Arg::new("feedback")
                .long("feedback")
                .short('f')
                .value_name("VALUE")
                .help("응답마다 적용할 피드백 값")
                .default_value("0.0"),
        )
        .arg(
            Arg::new("depth")
                .long("depth")
                .short('d')
                .value_name("BLOCKS")
                .help("패스 깊이 (기본은 설정의 pass_depth)"),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("❌ 오류: {:#}", e);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => PipelineConfig::from_json_file(Path::new(path))
            .with_context(|| format!("설정 파일을 읽을 수 없습니다: {}", path))?,
        None => PipelineConfig::default(),
    };
    let state = path_arg(matches, "state");
    let blocks = match matches.get_one::<String>("blocks") {
        Some(dir) => PathBuf::from(dir),
        None => SessionPaths::blocks_beside(&state),
    };
    let paths = SessionPaths {
        state,
        vocabulary: path_arg(matches, "vocabulary"),
        profile: path_arg(matches, "profile"),
        blocks,
    };
    let feedback: f64 = matches
        .get_one::<String>("feedback")
        .map(|value| value.parse())
        .transpose()
        .context("피드백 값은 실수여야 합니다")?
        .unwrap_or(0.0);

    let mut session = Session::open(config, paths)?;
    if let Some(depth) = matches.get_one::<String>("depth") {
        let depth = depth.parse().context("패스 깊이는 정수여야 합니다")?;
        session = session.with_depth(depth);
    }

    println!("NBAS chat ready. Type 'quit' to exit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        let reply = session.respond(input, feedback)?;
        println!("AI: {}", reply.transformed);
        println!("AI: {}", reply.remark);
        println!("(mood: {})", reply.mood);
    }

    session.close()
}

fn path_arg(matches: &ArgMatches, name: &str) -> PathBuf {
    matches
        .get_one::<String>(name)
        .map(PathBuf::from)
        .unwrap_or_default()
}
