use http::StatusCode;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRAILER, TRANSFER_ENCODING};
use micro_h1::connection::ResponseWriter;
use micro_h1::handler::Handler;
use micro_h1::protocol::{Headers, Request, SendError, default_headers};
use micro_h1::server::Server;
use tokio::io::AsyncWrite;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const PORT: u16 = 42069;
const MAX_CHUNK_SIZE: usize = 1024;

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

const INTERNAL_SERVER_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

/// Serves three static pages, plus `/stream/<n>` which sends `n` bytes chunked
/// with the byte count as a trailer.
struct PageHandler;

impl PageHandler {
    async fn page<W>(writer: &mut ResponseWriter<W>, status: StatusCode, page: &str) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut headers = default_headers(page.len());
        headers.replace(CONTENT_TYPE.as_str(), mime::TEXT_HTML.as_ref());

        writer.write_status_line(status)?;
        writer.write_headers(&headers)?;
        writer.write_body(page.as_bytes()).await?;
        Ok(())
    }

    async fn stream<W>(writer: &mut ResponseWriter<W>, size: usize) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut headers = default_headers(0);
        headers.delete(CONTENT_LENGTH.as_str());
        headers.set(TRANSFER_ENCODING.as_str(), "chunked");
        headers.replace(TRAILER.as_str(), "X-Content-Length");

        writer.write_status_line(StatusCode::OK)?;
        writer.write_headers(&headers)?;

        let data: Vec<u8> = (b'a'..=b'z').cycle().take(size).collect();
        let mut sent = 0;
        for chunk in data.chunks(MAX_CHUNK_SIZE) {
            sent += writer.write_chunked_body(chunk).await?;
        }
        writer.write_chunked_body_done().await?;

        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", &sent.to_string());
        writer.write_trailers(&trailers).await
    }
}

impl Handler for PageHandler {
    async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Request)
    where
        W: AsyncWrite + Unpin + Send,
    {
        let target = request.target();
        let result = if let Some(size) = target.strip_prefix("/stream/") {
            match size.parse::<usize>() {
                Ok(size) => Self::stream(writer, size).await,
                Err(_) => Self::page(writer, StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE).await,
            }
        } else {
            match target {
                "/yourproblem" => Self::page(writer, StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE).await,
                "/myproblem" => Self::page(writer, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_PAGE).await,
                _ => Self::page(writer, StatusCode::OK, OK_PAGE).await,
            }
        };

        if let Err(e) = result {
            error!(path = target, cause = %e, "can't write response");
        }
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = match Server::builder().address(("127.0.0.1", PORT)).bind(PageHandler).await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };
    info!(local_addr = %server.local_addr(), "server started");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "can't listen for ctrl-c");
    }

    match server.shutdown().await {
        Ok(()) => info!("server gracefully stopped"),
        Err(e) => error!(cause = %e, "server shutdown error"),
    }
}
