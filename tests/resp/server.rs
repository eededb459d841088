//! Minimal SET/GET/DEL server speaking RESP2.

use std::collections::HashMap;
use std::io::{BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kvrelay::Endpoint;
use kvrelay_backend::resp::read_value;
use kvrelay_backend::RespValue;
use parking_lot::Mutex;

pub type Data = Arc<Mutex<HashMap<String, String>>>;

/// Server bound to a fixed port. `shutdown` closes the listener and every
/// session; `start_on` can bind the same port again.
pub struct FakeServer {
    port: u16,
    data: Data,
    running: Arc<AtomicBool>,
    sessions: Arc<Mutex<Vec<TcpStream>>>,
    acceptor: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        Self::serve(listener, Arc::new(Mutex::new(HashMap::new())))
    }

    pub fn start_on(port: u16, data: Data) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        Self::serve(listener, data)
    }

    fn serve(listener: TcpListener, data: Data) -> Self {
        let port = listener.local_addr().unwrap().port();
        listener.set_nonblocking(true).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let sessions = Arc::new(Mutex::new(Vec::new()));

        let acceptor = {
            let running = Arc::clone(&running);
            let sessions = Arc::clone(&sessions);
            let data = Arc::clone(&data);
            thread::spawn(move || {
                while running.load(Ordering::SeqCst) {
                    match listener.accept() {
                        Ok((stream, _)) => {
                            stream.set_nonblocking(false).unwrap();
                            sessions.lock().push(stream.try_clone().unwrap());
                            let data = Arc::clone(&data);
                            thread::spawn(move || session(stream, data));
                        }
                        Err(_) => thread::sleep(Duration::from_millis(5)),
                    }
                }
            })
        };

        Self {
            port,
            data,
            running,
            sessions,
            acceptor: Some(acceptor),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port).unwrap()
    }

    pub fn address(&self) -> String {
        self.endpoint().to_string()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn data(&self) -> Data {
        Arc::clone(&self.data)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(acceptor) = self.acceptor.take() {
            acceptor.join().unwrap();
        }
        for stream in self.sessions.lock().drain(..) {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn arg(value: &RespValue) -> String {
    match value {
        RespValue::Bulk(Some(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    }
}

fn session(stream: TcpStream, data: Data) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });
    let mut writer = stream;
    while let Ok(RespValue::Array(Some(args))) = read_value(&mut reader) {
        let name = args.first().map(arg).unwrap_or_default();
        let key = args.get(1).map(arg).unwrap_or_default();
        let reply = match name.as_str() {
            "SET" => {
                let value = args.get(2).map(arg).unwrap_or_default();
                data.lock().insert(key, value);
                "+OK\r\n".to_string()
            }
            "GET" => match data.lock().get(&key) {
                Some(v) => format!("${}\r\n{}\r\n", v.len(), v),
                None => "$-1\r\n".to_string(),
            },
            "DEL" => format!(":{}\r\n", data.lock().remove(&key).map_or(0, |_| 1)),
            _ => "-ERR unknown command\r\n".to_string(),
        };
        if writer.write_all(reply.as_bytes()).is_err() {
            return;
        }
    }
}
