#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;
use turbo_setup::core::fetch::Fetcher;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub enum Reply {
    Ok { body: Vec<u8>, content_length: bool },
    Status(u16, &'static str),
}

/// Serves a single HTTP response on a loopback port and returns the URL to fetch.
pub fn serve_once(reply: Reply) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let (mut stream, _) = match listener.accept() {
            Ok(conn) => conn,
            Err(_) => return,
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let (head, body) = match reply {
            Reply::Ok {
                body,
                content_length,
            } => {
                let mut head = String::from("HTTP/1.1 200 OK\r\nConnection: close\r\n");
                if content_length {
                    head.push_str(&format!("Content-Length: {}\r\n", body.len()));
                }
                (head, body)
            }
            Reply::Status(code, reason) => (
                format!("HTTP/1.1 {code} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n"),
                Vec::new(),
            ),
        };

        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(b"\r\n");
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });

    format!("http://{addr}/TURBOC3.zip")
}

/// A fetcher that talks to the loopback server directly, whatever proxy the
/// environment configures.
pub fn local_fetcher() -> Fetcher {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .unwrap();
    Fetcher::with_client(client)
}

/// Builds an uncompressed archive so entry sizes dominate the buffer length.
pub fn stored_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn turbo_archive() -> Vec<u8> {
    let exe: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    stored_zip(&[("BIN/tc.exe", exe.as_slice())])
}

pub fn write_dosbox_config(app_data: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let dir = app_data.join("DOSBox");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
