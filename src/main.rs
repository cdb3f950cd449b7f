use std::io;

use actix_web::{web, App, HttpServer};
use chaos_paint::{
    env::Settings, server::end_point, server::types::ServerState, utils, LogExt, LoggerManager,
};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "chaos paint backend",           // 프로그램 이름
    author = env!("CARGO_PKG_AUTHORS"),       // 작성자
    version = env!("CARGO_PKG_VERSION"),           // 버전
    about = env!("CARGO_PKG_DESCRIPTION"),   // 짧은 설명
    long_about = None,
)]
struct Args {
    /// host:port 형식. 설정 파일의 server.bind_address / server.port 를 덮어씀
    #[arg(long = "addr")]
    addr: Option<String>,

    /// 짧은 타이밍 프로필을 쓰고 고정 디버그 세션을 만든다
    #[arg(long = "debug")]
    debug: bool,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    utils::mark_startup();

    // 1. 환경변수 로드
    dotenv::dotenv().ok();
    let args = Args::parse();

    // 2. 설정 파일 로드
    let mut settings = Settings::new().map_err(io::Error::other)?;
    if args.debug {
        settings.game.debug = true;
    }

    // 3. 로거 초기화
    let _logger = LoggerManager::setup(&settings);

    // 4. 서버 상태 구성
    let state = ServerState::new(&settings);
    if settings.game.debug {
        let debug_id = settings.game.debug_session_id.clone();
        state
            .registry
            .create_pinned(&debug_id, state.session_config.clone())
            .await;
        info!("디버그 세션 준비 완료: session={}", debug_id);
    }

    // 5. HTTP 서버 시작
    let bind_address = args.addr.unwrap_or_else(|| settings.bind_address());
    info!("서버 시작: {}", bind_address);

    let data = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(end_point::configure)
    })
    .bind(&bind_address)
    .log_err(|e| error!("바인드 실패: {}, error={}", bind_address, e))?
    .run();

    let handle = server.handle();
    tokio::select! {
        result = server => {
            result.log_ok(|_| info!("서버 종료: uptime_ms={}", utils::uptime_ms()))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("종료 신호 수신, 서버를 정리합니다.");
            handle.stop(true).await;
            info!("서버 종료: uptime_ms={}", utils::uptime_ms());
            Ok(())
        }
    }
}
