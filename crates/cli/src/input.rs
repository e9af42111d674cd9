//! Line input read off the async runtime.
//!
//! Tokio reads stdin on its blocking pool, and a read parked there keeps the
//! runtime from shutting down until the user presses Enter. Lines are read on
//! a plain thread instead, so dropping the receiver is enough to stop waiting.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

/// Read lines from `reader` on a dedicated thread.
///
/// Each line arrives without its trailing newline. The channel closes at
/// end of input, after a read error is delivered, or once the receiver is
/// dropped.
pub fn spawn_line_reader<R>(mut reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);

    thread::spawn(move || {
        loop {
            let mut line = String::new();
            let item = match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\n', '\r']).len();
                    line.truncate(trimmed);
                    Ok(line)
                }
                Err(e) => Err(e),
            };
            let failed = item.is_err();
            if tx.blocking_send(item).is_err() || failed {
                break;
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[tokio::test]
    async fn lines_arrive_in_order_then_close() {
        let mut rx = spawn_line_reader(Cursor::new("connect server.py\r\nweather?\nlast"));

        assert_eq!(rx.recv().await.unwrap().unwrap(), "connect server.py");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "weather?");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "last");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn empty_input_closes_immediately() {
        let mut rx = spawn_line_reader(Cursor::new(""));
        assert!(rx.recv().await.is_none());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("terminal went away"))
        }
    }

    #[tokio::test]
    async fn read_error_is_delivered_once() {
        let mut rx = spawn_line_reader(io::BufReader::new(Broken));

        let err = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "terminal went away");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn pending_read_does_not_hold_the_runtime() {
        // A reader that never yields a line stands in for an idle terminal.
        struct Idle;
        impl Read for Idle {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                loop {
                    thread::park();
                }
            }
        }

        let mut rx = spawn_line_reader(io::BufReader::new(Idle));
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
        assert!(waited.is_err());
    }
}
