//! UCI protocol front-end and command loop.
//!
//! Parses UCI commands, tracks the current position as FEN, routes `go`
//! requests to the [`BlindfoldEngine`] at the selected level, and emits
//! protocol-compliant output. Diagnostics go through `tracing` (stderr) so
//! stdout carries protocol lines only.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::engines::engine_facade::BlindfoldEngine;
use crate::engines::engine_trait::MoveResult;
use crate::errors::{EngineError, EngineResult};
use crate::oracle::position_oracle::PositionOracle;
use crate::oracle::shakmaty_oracle::{ShakmatyOracle, START_FEN};
use crate::search::board_scoring::MATE_SCORE;

const UCI_ENGINE_NAME: &str = "Blindfold Engine";
const UCI_ENGINE_AUTHOR: &str = "the Blindfold Engine authors";

/// Evaluations this close to `MATE_SCORE` are reported as `score mate`.
const MATE_WINDOW: i32 = 100;

pub async fn run_stdio_loop(engine: BlindfoldEngine, level: &str) -> io::Result<()> {
    let mut uci = UciState::new(engine);
    if let Err(err) = uci.set_level(level) {
        warn!(%err, level, "falling back to the default level");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();
    while let Some(line) = lines.next_line().await? {
        let should_quit = uci.handle_command(&line, &mut stdout).await?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    uci.engine.destroy();
    Ok(())
}

pub struct UciState {
    engine: BlindfoldEngine,
    oracle: ShakmatyOracle,
    position: String,
    level: &'static str,
    debug_mode: bool,
}

impl UciState {
    pub fn new(engine: BlindfoldEngine) -> Self {
        let level = engine
            .get_all_levels()
            .first()
            .map(|summary| summary.key)
            .unwrap_or("beginner");
        Self {
            engine,
            oracle: ShakmatyOracle,
            position: START_FEN.to_owned(),
            level,
            debug_mode: false,
        }
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn set_level(&mut self, key: &str) -> EngineResult<()> {
        self.level = self.engine.catalog().get(key)?.key;
        Ok(())
    }

    pub async fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default();

        match cmd {
            "uci" => {
                writeln!(out, "id name {}", UCI_ENGINE_NAME)?;
                writeln!(out, "id author {}", UCI_ENGINE_AUTHOR)?;
                let levels = self.engine.get_all_levels();
                let vars: Vec<String> = levels.iter().map(|l| format!("var {}", l.key)).collect();
                writeln!(
                    out,
                    "option name Level type combo default {} {}",
                    self.level,
                    vars.join(" ")
                )?;
                writeln!(
                    out,
                    "option name Skill Level type spin default {} min 1 max {}",
                    self.skill_ordinal(),
                    levels.len()
                )?;
                writeln!(out, "uciok")?;
            }
            "isready" => {
                if let Err(err) = self.engine.initialize().await {
                    writeln!(out, "info string engine error: {}", err)?;
                }
                writeln!(out, "readyok")?;
            }
            "setoption" => {
                if let Err(err) = self.handle_setoption(trimmed) {
                    writeln!(out, "info string setoption error: {}", err)?;
                }
            }
            "ucinewgame" => {
                self.position = START_FEN.to_owned();
            }
            "position" => {
                if let Err(err) = self.handle_position(trimmed) {
                    writeln!(out, "info string position error: {}", err)?;
                }
            }
            "go" => {
                if let Err(err) = self.handle_go(out).await {
                    writeln!(out, "info string go error: {}", err)?;
                    writeln!(out, "bestmove 0000")?;
                }
            }
            "levels" => {
                for summary in self.engine.get_all_levels() {
                    writeln!(
                        out,
                        "info string level {} \"{}\" rating {}",
                        summary.key, summary.name, summary.rating
                    )?;
                }
            }
            "stop" | "ponderhit" => {
                // Every search is bounded; nothing to interrupt.
            }
            "debug" => {
                let mode = parts.next().unwrap_or_default();
                self.debug_mode = mode.eq_ignore_ascii_case("on");
            }
            "quit" => {
                return Ok(true);
            }
            _ => {
                debug!(command = trimmed, "ignoring unknown command");
            }
        }

        Ok(false)
    }

    fn skill_ordinal(&self) -> usize {
        self.engine
            .get_all_levels()
            .iter()
            .position(|l| l.key == self.level)
            .map_or(1, |i| i + 1)
    }

    fn handle_setoption(&mut self, line: &str) -> EngineResult<()> {
        let mut tokens = line.split_whitespace();
        let _ = tokens.next(); // setoption

        let mut name_tokens = Vec::<&str>::new();
        let mut value_tokens = Vec::<&str>::new();
        let mut mode = "";

        for tok in tokens {
            match tok {
                "name" => mode = "name",
                "value" => mode = "value",
                _ if mode == "name" => name_tokens.push(tok),
                _ if mode == "value" => value_tokens.push(tok),
                _ => {}
            }
        }

        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");

        if name.eq_ignore_ascii_case("Level") {
            self.set_level(&value)?;
        } else if name.eq_ignore_ascii_case("Skill Level") {
            let level = value
                .parse::<usize>()
                .ok()
                .and_then(|ordinal| self.engine.catalog().nth(ordinal))
                .ok_or_else(|| EngineError::UnknownLevel(value.clone()))?;
            self.level = level.key;
        } else {
            debug!(option = %name, "ignoring unsupported option");
        }

        Ok(())
    }

    fn handle_position(&mut self, line: &str) -> EngineResult<()> {
        let mut tokens = line.split_whitespace().peekable();
        let _ = tokens.next(); // "position"

        let invalid = |reason: &str| EngineError::InvalidPosition {
            encoded: line.to_owned(),
            reason: reason.to_owned(),
        };

        let mut position = match tokens.next() {
            Some("startpos") => self.oracle.load_position(START_FEN)?,
            Some("fen") => {
                let mut fen_parts = Vec::<&str>::new();
                while let Some(next) = tokens.next_if(|tok| *tok != "moves") {
                    fen_parts.push(next);
                }
                if fen_parts.is_empty() {
                    return Err(invalid("missing FEN after 'position fen'"));
                }
                self.oracle.load_position(&fen_parts.join(" "))?
            }
            Some(other) => return Err(invalid(&format!("unsupported position token '{other}'"))),
            None => return Err(invalid("incomplete position command")),
        };

        if tokens.next_if_eq(&"moves").is_some() {
            for lan in tokens {
                let mv = self
                    .oracle
                    .legal_moves(&position)
                    .into_iter()
                    .find(|candidate| candidate.uci() == lan)
                    .ok_or_else(|| EngineError::IllegalMove(lan.to_owned()))?;
                position = self.oracle.apply(&position, &mv)?;
            }
        }

        self.position = self.oracle.encode(&position);
        Ok(())
    }

    async fn handle_go(&mut self, out: &mut impl Write) -> EngineResult<()> {
        self.engine.initialize().await?;
        if self.debug_mode {
            writeln!(out, "info string position {}", self.position)
                .map_err(|e| EngineError::Worker(e.to_string()))?;
        }
        let result = self.engine.analyze(&self.position, self.level).await?;
        for info in info_lines(&result) {
            writeln!(out, "{}", info).map_err(|e| EngineError::Worker(e.to_string()))?;
        }
        writeln!(out, "bestmove {}", result.best_move.to_uci())
            .map_err(|e| EngineError::Worker(e.to_string()))?;
        Ok(())
    }
}

fn info_lines(result: &MoveResult) -> Vec<String> {
    let mut lines = vec![format!(
        "info string level {} rating {} strategy {} confidence {:.2}",
        result.level,
        result.rating,
        result.strategy.unwrap_or("none"),
        result.confidence
    )];
    if result.is_none() {
        return lines;
    }

    let mut search = format!(
        "info depth {} time {}",
        result.depth,
        result.elapsed.as_millis()
    );
    if let Some(cp) = result.evaluation {
        if cp.abs() >= MATE_SCORE - MATE_WINDOW {
            let moves = MATE_SCORE - cp.abs();
            search.push_str(&format!(" score mate {}", moves * cp.signum()));
        } else {
            search.push_str(&format!(" score cp {}", cp));
        }
    }
    search.push_str(&format!(" pv {}", result.best_move.to_uci()));
    lines.push(search);
    lines
}
