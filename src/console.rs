//! Checkers Engine - Text Protocol Module
//!
//! A line-oriented protocol on stdin/stdout, modelled on UCI, that lets a
//! front end or a script drive the rules engine and the computer player.

use log::{info, warn};
use std::io::{self, BufRead, Write};

use crate::board::{Board, Destination, MoveEvent};
use crate::config::{CapturePolicy, GameConfig, MAX_SEARCH_DEPTH, MAX_SIZE, MIN_SIZE};
use crate::error::CheckersError;
use crate::evaluation::material;
use crate::game_end::{check_game_end, GameEnd};
use crate::move_generator::MoveGenerator;
use crate::search::{TieBreak, WIN_SCORE};
use crate::types::*;
use crate::worker::SearchWorker;

// Engine identification
const ENGINE_NAME: &str = "Checkers Engine";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scores this close to a win are reported as plies to the end
const WIN_THRESHOLD: i32 = WIN_SCORE - 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Spin { min: i64, max: i64 },
    Check,
}

/// A named engine option settable with `setoption`
#[derive(Clone, Debug)]
pub struct ConsoleOption {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: i64,
    pub value: i64,
}

impl ConsoleOption {
    pub fn spin(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        ConsoleOption { name, kind: OptionKind::Spin { min, max }, default, value: default }
    }

    pub fn check(name: &'static str, default: bool) -> Self {
        let default = default as i64;
        ConsoleOption { name, kind: OptionKind::Check, default, value: default }
    }

    pub fn describe(&self) -> String {
        match self.kind {
            OptionKind::Spin { min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                self.name, self.default, min, max
            ),
            OptionKind::Check => format!(
                "option name {} type check default {}",
                self.name,
                self.default != 0
            ),
        }
    }

    /// Returns false if the value does not parse or is out of range
    pub fn set_value(&mut self, value_str: &str) -> bool {
        match self.kind {
            OptionKind::Spin { min, max } => match value_str.parse::<i64>() {
                Ok(val) if (min..=max).contains(&val) => {
                    self.value = val;
                    true
                }
                _ => false,
            },
            OptionKind::Check => match value_str.to_ascii_lowercase().as_str() {
                "true" => {
                    self.value = 1;
                    true
                }
                "false" => {
                    self.value = 0;
                    true
                }
                _ => false,
            },
        }
    }

    pub fn get_int(&self) -> i64 {
        self.value
    }

    pub fn get_bool(&self) -> bool {
        self.value != 0
    }
}

/// Protocol handler owning the game in progress
pub struct Console<W: Write> {
    board: Board,
    move_generator: MoveGenerator,
    worker: SearchWorker,
    options: Vec<ConsoleOption>,
    out: W,
    running: bool,
}

impl Console<io::Stdout> {
    pub fn new() -> Self {
        Console::with_output(io::stdout())
    }

    /// Serve commands from stdin until `quit` or end of input
    pub fn run(&mut self) {
        let stdin = io::stdin();
        self.run_with(stdin.lock());
    }
}

impl Default for Console<io::Stdout> {
    fn default() -> Self {
        Console::new()
    }
}

impl<W: Write> Console<W> {
    pub fn with_output(out: W) -> Self {
        let board = Board::default();
        let defaults = board.config().clone();
        let mut console = Console {
            board,
            move_generator: MoveGenerator::new(),
            worker: SearchWorker::new(),
            options: Vec::new(),
            out,
            running: true,
        };
        console.init_options(&defaults);
        console
    }

    fn init_options(&mut self, defaults: &GameConfig) {
        self.options = vec![
            ConsoleOption::spin("GridSize", defaults.size as i64, MIN_SIZE as i64, MAX_SIZE as i64),
            ConsoleOption::spin("PlayerRows", defaults.player_rows as i64, 1, (MAX_SIZE / 2 - 1) as i64),
            ConsoleOption::check("MandatoryCapture", defaults.mandatory_capture),
            ConsoleOption::check("LongestCapture", defaults.capture_policy == CapturePolicy::LongestChain),
            ConsoleOption::check("AutoCapture", defaults.auto_capture_single_option),
            ConsoleOption::check("MoveBackwards", defaults.can_move_backwards),
            ConsoleOption::check("CaptureBackwards", defaults.can_capture_backwards),
            ConsoleOption::check("FlyingKing", defaults.flying_king),
            ConsoleOption::spin("Depth", defaults.search_depth as i64, 1, MAX_SEARCH_DEPTH as i64),
            ConsoleOption::spin("KingMoveLimit", defaults.king_only_move_limit as i64, 1, 1000),
        ];
    }

    fn option(&self, name: &str) -> Option<&ConsoleOption> {
        self.options.iter().find(|o| o.name == name)
    }

    fn int_option(&self, name: &str) -> i64 {
        self.option(name).map_or(0, ConsoleOption::get_int)
    }

    fn bool_option(&self, name: &str) -> bool {
        self.option(name).is_some_and(ConsoleOption::get_bool)
    }

    /// Configuration described by the current option values
    fn config_from_options(&self) -> GameConfig {
        GameConfig {
            size: self.int_option("GridSize") as usize,
            player_rows: self.int_option("PlayerRows") as usize,
            mandatory_capture: self.bool_option("MandatoryCapture"),
            capture_policy: if self.bool_option("LongestCapture") {
                CapturePolicy::LongestChain
            } else {
                CapturePolicy::AnyChain
            },
            auto_capture_single_option: self.bool_option("AutoCapture"),
            can_move_backwards: self.bool_option("MoveBackwards"),
            can_capture_backwards: self.bool_option("CaptureBackwards"),
            flying_king: self.bool_option("FlyingKing"),
            search_depth: self.int_option("Depth") as u32,
            king_only_move_limit: self.int_option("KingMoveLimit") as u32,
        }
    }

    /// Bring option values in line with a restored board's configuration
    fn sync_options(&mut self, config: &GameConfig) {
        for opt in &mut self.options {
            opt.value = match opt.name {
                "GridSize" => config.size as i64,
                "PlayerRows" => config.player_rows as i64,
                "MandatoryCapture" => config.mandatory_capture as i64,
                "LongestCapture" => (config.capture_policy == CapturePolicy::LongestChain) as i64,
                "AutoCapture" => config.auto_capture_single_option as i64,
                "MoveBackwards" => config.can_move_backwards as i64,
                "CaptureBackwards" => config.can_capture_backwards as i64,
                "FlyingKing" => config.flying_king as i64,
                "Depth" => config.search_depth as i64,
                "KingMoveLimit" => config.king_only_move_limit as i64,
                _ => opt.value,
            };
        }
    }

    /// Start a new game from the options. Options that do not form a
    /// valid configuration keep the current game.
    fn new_game(&mut self) {
        match Board::from_config(self.config_from_options()) {
            Ok(board) => {
                info!("new game on {}x{}", board.size(), board.size());
                self.board = board;
            }
            Err(err) => {
                warn!("options rejected: {}", err);
                self.send(&format!("info string {}", err));
            }
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn run_with<R: BufRead>(&mut self, input: R) {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("stopped reading input: {}", err);
                    break;
                }
            };
            let line = line.trim();
            if !line.is_empty() {
                self.process_command(line);
            }
            if !self.running {
                break;
            }
        }
    }

    pub fn process_command(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return;
        }

        let command = parts[0];
        let args = &parts[1..];

        match command {
            "checkers" => self.cmd_checkers(),
            "isready" => self.send("readyok"),
            "setoption" => self.cmd_setoption(args),
            "newgame" => self.new_game(),
            "position" => self.cmd_position(args),
            "save" => self.cmd_save(),
            "move" => self.cmd_move(args),
            "moves" => self.cmd_moves(),
            "go" => self.cmd_go(args, false),
            "play" => self.cmd_go(args, true),
            "result" => self.cmd_result(),
            "d" => self.cmd_display(),
            "perft" => self.cmd_perft(args),
            "quit" => self.running = false,
            _ => {
                warn!("unknown command: {}", command);
                self.send(&format!("info string unknown command: {}", command));
            }
        }
    }

    fn send(&mut self, message: &str) {
        writeln!(self.out, "{}", message).ok();
        self.out.flush().ok();
    }

    fn cmd_checkers(&mut self) {
        self.send(&format!("id name {} {}", ENGINE_NAME, ENGINE_VERSION));
        let lines: Vec<String> = self.options.iter().map(ConsoleOption::describe).collect();
        for line in lines {
            self.send(&line);
        }
        self.send("checkersok");
    }

    fn cmd_setoption(&mut self, args: &[&str]) {
        if args.len() < 2 || args[0] != "name" {
            warn!("malformed setoption: {}", args.join(" "));
            return;
        }

        // Parse option name and value
        let mut name_parts = Vec::new();
        let mut value_str = None;
        let mut i = 1;
        while i < args.len() {
            if args[i] == "value" {
                if i + 1 < args.len() {
                    value_str = Some(args[i + 1..].join(" "));
                }
                break;
            }
            name_parts.push(args[i]);
            i += 1;
        }
        let name = name_parts.join(" ");

        let accepted = match (self.options.iter_mut().find(|o| o.name == name), value_str) {
            (Some(opt), Some(value)) => opt.set_value(&value),
            _ => false,
        };

        if !accepted {
            warn!("option rejected: {}", args.join(" "));
            self.send(&format!("info string cannot set option {}", name));
            return;
        }

        // Rules are fixed per game, so a change starts a fresh one
        if self.config_from_options() != *self.board.config() {
            self.new_game();
        }
    }

    fn cmd_position(&mut self, args: &[&str]) {
        if args.first() != Some(&"snapshot") || args.len() < 2 {
            warn!("malformed position: {}", args.join(" "));
            self.send("info string usage: position snapshot <json>");
            return;
        }
        if self.refuse_while_searching() {
            return;
        }

        match Board::from_snapshot(&args[1..].join(" ")) {
            Ok(board) => {
                let config = board.config().clone();
                self.board = board;
                self.sync_options(&config);
            }
            Err(err) => {
                warn!("snapshot rejected: {}", err);
                self.send(&format!("info string {}", err));
            }
        }
    }

    fn cmd_save(&mut self) {
        match self.board.to_snapshot() {
            Ok(json) => self.send(&format!("snapshot {}", json)),
            Err(err) => self.send(&format!("info string {}", err)),
        }
    }

    fn refuse_while_searching(&mut self) -> bool {
        if self.worker.is_pending() {
            self.send(&format!("info string {}", CheckersError::SearchPending));
            return true;
        }
        false
    }

    /// Parse `c3-d4` or `c3xe5` into a pair of cells
    fn parse_move(text: &str) -> Option<(Coord, Coord)> {
        // Skip the first character: `x` is also a file letter on wide boards
        let (sep, _) = text
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-' || c == 'x' || c == 'X')?;
        Some((parse_square(&text[..sep])?, parse_square(&text[sep + 1..])?))
    }

    fn cmd_move(&mut self, args: &[&str]) {
        let Some(&text) = args.first() else {
            self.send("illegal none: no move given");
            return;
        };
        if self.refuse_while_searching() {
            return;
        }

        let reason = match Self::parse_move(text) {
            None => Some("cannot parse move".to_string()),
            Some(_) if check_game_end(&self.board).is_some() => Some("game is over".to_string()),
            Some((from, to)) => match self.board.piece_at(from) {
                None => Some(format!("no piece on {}", square_name(from))),
                Some(piece) if piece.owner != self.board.to_move() => {
                    Some(format!("{} is not to move", piece.owner))
                }
                Some(_) => match self.move_generator.get_destination(&self.board, from, to) {
                    Some(destination) => {
                        self.apply_and_report(from, &destination);
                        None
                    }
                    None => Some(format!("{} cannot reach {}", square_name(from), square_name(to))),
                },
            },
        };

        if let Some(reason) = reason {
            warn!("illegal move {}: {}", text, reason);
            self.send(&format!("illegal {}: {}", text, reason));
        }
    }

    /// Apply a destination legal on the current board, report it and any
    /// game end, then play out forced single captures when enabled
    fn apply_and_report(&mut self, source: Coord, destination: &Destination) {
        if !self.apply_one(source, destination, false) {
            return;
        }

        while check_game_end(&self.board).is_none() {
            let to_move = self.board.to_move();
            match self.move_generator.forced_capture(&self.board, to_move) {
                Some((from, forced)) => {
                    if !self.apply_one(from, &forced, true) {
                        return;
                    }
                }
                None => break,
            }
        }

        if let Some(end) = check_game_end(&self.board) {
            self.send(&describe_end(Some(end)));
        }
    }

    fn apply_one(&mut self, source: Coord, destination: &Destination, forced: bool) -> bool {
        if !self.move_generator.is_legal(&self.board, source, destination) {
            warn!("rejected {} on the current board", destination.notation(source));
            self.send(&format!("illegal {}: not a legal move", destination.notation(source)));
            return false;
        }
        match self.board.apply(source, destination) {
            Ok(event) => {
                let mut line = format!("moved {}", describe_event(&event, destination));
                if forced {
                    line.push_str(" forced");
                }
                self.send(&line);
                true
            }
            Err(err) => {
                warn!("apply failed: {}", err);
                self.send(&format!("illegal {}: {}", destination.notation(source), err));
                false
            }
        }
    }

    fn cmd_moves(&mut self) {
        let entries = self.move_generator.movable_entries(&self.board, self.board.to_move());
        if entries.is_empty() {
            self.send("movable none");
            return;
        }
        for (source, destinations) in entries {
            let targets: Vec<String> = destinations
                .iter()
                .map(|d| {
                    let prefix = if d.is_capture() { "x" } else { "" };
                    format!("{}{}", prefix, square_name(d.landing))
                })
                .collect();
            self.send(&format!("movable {}: {}", square_name(source), targets.join(" ")));
        }
    }

    fn cmd_go(&mut self, args: &[&str], apply: bool) {
        let mut depth = self.board.config().search_depth;
        let mut tie_break = TieBreak::FirstFound;

        let mut i = 0;
        while i < args.len() {
            match args[i] {
                "depth" if i + 1 < args.len() => {
                    if let Ok(d) = args[i + 1].parse::<u32>() {
                        depth = d.clamp(1, MAX_SEARCH_DEPTH);
                    }
                    i += 2;
                }
                "seed" if i + 1 < args.len() => {
                    if let Ok(seed) = args[i + 1].parse::<u64>() {
                        tie_break = TieBreak::Random { seed };
                    }
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        if check_game_end(&self.board).is_some() {
            self.send("bestmove none");
            return;
        }

        let ai = self.board.to_move();
        let receiver = match self.worker.start(&self.board, ai, ai.opponent(), depth, tie_break) {
            Ok(receiver) => receiver,
            Err(err) => {
                self.send(&format!("info string {}", err));
                return;
            }
        };

        let outcome = match self.worker.wait(&receiver) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("search failed: {}", err);
                self.send(&format!("info string {}", err));
                self.send("bestmove none");
                return;
            }
        };

        self.send(&format!(
            "info depth {} score {} nodes {} time {}",
            depth,
            format_score(outcome.score),
            outcome.nodes,
            outcome.elapsed.as_millis()
        ));
        self.send(&format!("bestmove {}", outcome.destination.notation(outcome.source)));

        if apply {
            self.apply_and_report(outcome.source, &outcome.destination);
        }
    }

    fn cmd_result(&mut self) {
        let end = check_game_end(&self.board);
        self.send(&describe_end(end));
    }

    fn cmd_display(&mut self) {
        let to_move = self.board.to_move();
        let movable = self.move_generator.movable_entries(&self.board, to_move).len();
        let diagram = self.board.display();
        self.send(&diagram);
        self.send(&format!("side to move {}", to_move));
        self.send(&format!("movable pieces {}", movable));
        self.send(&format!(
            "pieces white {} black {}",
            self.board.piece_count(Player::White),
            self.board.piece_count(Player::Black)
        ));
        self.send(&format!("material {}", material(&self.board, to_move)));
    }

    fn cmd_perft(&mut self, args: &[&str]) {
        let depth = args.first().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);
        match self.move_generator.perft(&self.board, self.board.to_move(), depth) {
            Ok(nodes) => self.send(&format!("nodes {}", nodes)),
            Err(err) => self.send(&format!("info string {}", err)),
        }
    }
}

fn format_score(score: i32) -> String {
    if score >= WIN_THRESHOLD {
        format!("win {}", WIN_SCORE - score)
    } else if score <= -WIN_THRESHOLD {
        format!("loss {}", WIN_SCORE + score)
    } else {
        score.to_string()
    }
}

fn describe_event(event: &MoveEvent, destination: &Destination) -> String {
    let mut text = destination.notation(event.source);
    if !event.captured.is_empty() {
        let names: Vec<String> = event.captured.iter().map(|&c| square_name(c)).collect();
        text.push_str(&format!(" captures {}", names.join(" ")));
    }
    if event.promoted {
        text.push_str(" promoted");
    }
    text
}

fn describe_end(end: Option<GameEnd>) -> String {
    match end {
        None => "result none".to_string(),
        Some(GameEnd { winner: Some(winner), reason }) => {
            format!("result winner {} reason {}", winner, reason)
        }
        Some(GameEnd { winner: None, reason }) => format!("result draw reason {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> Console<Vec<u8>> {
        Console::with_output(Vec::new())
    }

    fn take_output(console: &mut Console<Vec<u8>>) -> Vec<String> {
        let text = String::from_utf8(std::mem::take(&mut console.out)).unwrap();
        text.lines().map(str::to_string).collect()
    }

    fn small_game(console: &mut Console<Vec<u8>>) {
        console.process_command("setoption name PlayerRows value 3");
        console.process_command("setoption name GridSize value 8");
        take_output(console);
    }

    #[test]
    fn handshake_lists_options() {
        let mut c = console();
        c.process_command("checkers");
        let out = take_output(&mut c);
        assert!(out[0].starts_with("id name Checkers Engine"));
        assert!(out.contains(&"option name GridSize type spin default 10 min 4 max 26".to_string()));
        assert!(out.contains(&"option name FlyingKing type check default true".to_string()));
        assert_eq!(out.last().map(String::as_str), Some("checkersok"));
    }

    #[test]
    fn options_rebuild_the_board() {
        let mut c = console();
        small_game(&mut c);
        assert_eq!(c.board().size(), 8);
        assert_eq!(c.board().piece_count(Player::White), 12);

        // 8 - 2*4 leaves no neutral rows
        c.process_command("setoption name PlayerRows value 4");
        let out = take_output(&mut c);
        assert!(out[0].starts_with("info string illegal configuration"));
        assert_eq!(c.board().config().player_rows, 3);
    }

    #[test]
    fn move_and_reject() {
        let mut c = console();
        small_game(&mut c);

        c.process_command("move b3-c4");
        assert_eq!(take_output(&mut c), vec!["moved b3-c4".to_string()]);

        c.process_command("move c4-d5");
        let out = take_output(&mut c);
        assert_eq!(out[0], "illegal c4-d5: white is not to move");

        c.process_command("move a6-a5");
        let out = take_output(&mut c);
        assert_eq!(out[0], "illegal a6-a5: a6 cannot reach a5");
    }

    #[test]
    fn go_reports_a_legal_move() {
        let mut c = console();
        small_game(&mut c);
        c.process_command("go depth 2");
        let out = take_output(&mut c);
        assert!(out[0].starts_with("info depth 2 score "));
        let best = out[1].strip_prefix("bestmove ").unwrap();
        let (from, to) = Console::<Vec<u8>>::parse_move(best).unwrap();
        assert!(MoveGenerator::new().destination_allowed(c.board(), from, to));
    }

    #[test]
    fn save_and_restore() {
        let mut c = console();
        small_game(&mut c);
        c.process_command("move b3-c4");
        c.process_command("save");
        let out = take_output(&mut c);
        let json = out[1].strip_prefix("snapshot ").unwrap().to_string();

        let mut other = console();
        other.process_command(&format!("position snapshot {}", json));
        assert_eq!(other.board(), c.board());
        assert_eq!(other.int_option("GridSize"), 8);
    }

    #[test]
    fn auto_capture_plays_the_only_capture() {
        let mut c = console();
        let config = GameConfig { auto_capture_single_option: true, ..GameConfig::with_size(8, 3) };
        let mut board = Board::empty(config.clone()).unwrap();
        board.place(Coord::new(2, 3), Piece::man(Player::White)).unwrap();
        board.place(Coord::new(7, 0), Piece::man(Player::White)).unwrap();
        board.place(Coord::new(4, 5), Piece::man(Player::Black)).unwrap();
        c.board = board;
        c.sync_options(&config);

        c.process_command("move c4-d5");
        assert_eq!(take_output(&mut c), vec!["moved c4-d5", "moved e6xc4 captures d5 forced"]);
        assert_eq!(c.board().to_move(), Player::White);
    }

    #[test]
    fn stale_destination_is_refused() {
        let mut c = console();
        small_game(&mut c);
        let before = c.board().clone();

        // the landing is vacant and playable but two rows away
        c.apply_and_report(Coord::new(1, 2), &Destination::simple(Coord::new(3, 4)));
        assert_eq!(take_output(&mut c), vec!["illegal b3-d5: not a legal move"]);
        assert_eq!(c.board(), &before);
    }

    #[test]
    fn consecutive_searches_are_not_refused() {
        let mut c = console();
        small_game(&mut c);
        c.process_command("play depth 1");
        c.process_command("go depth 1");
        let out = take_output(&mut c);
        assert!(out.iter().all(|line| !line.starts_with("info string")), "{:?}", out);
        assert_eq!(out.iter().filter(|line| line.starts_with("bestmove ")).count(), 2);
    }

    #[test]
    fn scores_near_a_win_are_reported_in_plies() {
        assert_eq!(format_score(WIN_SCORE - 3), "win 3");
        assert_eq!(format_score(-(WIN_SCORE - 2)), "loss 2");
        assert_eq!(format_score(-40), "-40");
    }
}
