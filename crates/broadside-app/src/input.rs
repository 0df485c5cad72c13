//! Stdin key feeder for hardware-less play.
//!
//! Stands in for the cabinet keypad on a desk: lines `1`..`9` press the
//! matching panel button, `q` quits. The thread exits on EOF or quit and
//! raises the shared stop flag either way.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use broadside_panel::PanelProbe;

pub fn spawn_stdin_feeder(probe: PanelProbe, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("broadside-input".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                match line.trim() {
                    "q" | "quit" => break,
                    key => match key.parse::<usize>() {
                        Ok(n @ 1..=9) => probe.press(n - 1),
                        _ => log::debug!("ignored input line {key:?}"),
                    },
                }
            }
            stop.store(true, Ordering::Relaxed);
        })
        .expect("failed to spawn input thread")
}
