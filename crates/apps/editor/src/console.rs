//! Line-oriented operator commands.
//!
//! ```text
//! click 700000 3450000     load the feature under the point for editing
//! dblclick X Y             delete the feature under the point
//! context X Y              toggle the color of the feature under the point
//! draw / vertex X Y / finish
//! color yellow|black
//! reshape X,Y X,Y X,Y ...  replace the loaded feature's exterior ring
//! move RING INDEX X Y
//! commit / cancel / status / quit
//! resolution UNITS_PER_PX   map units per screen pixel for pointer queries
//! tile MINX MINY MAXX MAXY [WIDTH HEIGHT]
//! ```

use formats::PolygonGeometry;
use foundation::{Aabb2, MapPoint, Resolution};
use interaction::{Event, FillColor, Notice, Severity};

use crate::session::Session;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerGesture {
    Click,
    DoubleClick,
    Context,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pointer { gesture: PointerGesture, at: MapPoint },
    /// Any gesture that does not depend on the view.
    Event(Event),
    Status,
    /// Zoom change; later pointer gestures query at this resolution.
    Resolution(Resolution),
    Tile {
        bbox: Aabb2,
        width_px: u32,
        height_px: u32,
    },
    Quit,
}

impl Command {
    pub fn into_event(self, resolution: Resolution) -> Option<Event> {
        match self {
            Command::Pointer { gesture, at } => Some(match gesture {
                PointerGesture::Click => Event::SingleClick { at, resolution },
                PointerGesture::DoubleClick => Event::DoubleClick { at, resolution },
                PointerGesture::Context => Event::SecondaryAction { at, resolution },
            }),
            Command::Event(event) => Some(event),
            Command::Status
            | Command::Resolution(_)
            | Command::Tile { .. }
            | Command::Quit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError(pub String);

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CommandError {}

const DEFAULT_TILE_PX: u32 = 256;

/// Parses one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb {
        "click" => pointer(PointerGesture::Click, &args)?,
        "dblclick" => pointer(PointerGesture::DoubleClick, &args)?,
        "context" => pointer(PointerGesture::Context, &args)?,
        "draw" => {
            arity(verb, &args, 0)?;
            Command::Event(Event::DrawStart)
        }
        "vertex" => {
            arity(verb, &args, 2)?;
            Command::Event(Event::DrawVertex {
                at: point(args[0], args[1])?,
            })
        }
        "finish" => {
            arity(verb, &args, 0)?;
            Command::Event(Event::DrawComplete)
        }
        "color" => {
            arity(verb, &args, 1)?;
            let color = FillColor::parse(args[0])
                .ok_or_else(|| CommandError(format!("unknown color `{}`", args[0])))?;
            Command::Event(Event::SelectColor(color))
        }
        "reshape" => {
            if args.len() < 3 {
                return Err(CommandError(
                    "reshape needs at least 3 X,Y vertices".to_string(),
                ));
            }
            let ring = args
                .iter()
                .map(|pair| {
                    let (x, y) = pair
                        .split_once(',')
                        .ok_or_else(|| CommandError(format!("expected X,Y, got `{pair}`")))?;
                    point(x, y)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Command::Event(Event::Reshape {
                geometry: PolygonGeometry::from_exterior(ring),
            })
        }
        "move" => {
            arity(verb, &args, 4)?;
            Command::Event(Event::MoveVertex {
                ring: number(args[0])?,
                index: number(args[1])?,
                to: point(args[2], args[3])?,
            })
        }
        "commit" => {
            arity(verb, &args, 0)?;
            Command::Event(Event::Commit)
        }
        "cancel" => {
            arity(verb, &args, 0)?;
            Command::Event(Event::Cancel)
        }
        "status" => Command::Status,
        "resolution" => {
            arity(verb, &args, 1)?;
            let resolution = Resolution::new(coordinate(args[0])?).ok_or_else(|| {
                CommandError(format!("resolution must be positive, got `{}`", args[0]))
            })?;
            Command::Resolution(resolution)
        }
        "tile" => {
            let (width_px, height_px) = match args.len() {
                4 => (DEFAULT_TILE_PX, DEFAULT_TILE_PX),
                6 => (number(args[4])?, number(args[5])?),
                _ => {
                    return Err(CommandError(
                        "usage: tile MINX MINY MAXX MAXY [WIDTH HEIGHT]".to_string(),
                    ))
                }
            };
            let min = point(args[0], args[1])?;
            let max = point(args[2], args[3])?;
            if min.x >= max.x || min.y >= max.y {
                return Err(CommandError("tile bbox must have min < max".to_string()));
            }
            Command::Tile {
                bbox: Aabb2::new([min.x, min.y], [max.x, max.y]),
                width_px,
                height_px,
            }
        }
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError(format!("unknown command `{other}`"))),
    };
    Ok(Some(command))
}

fn pointer(gesture: PointerGesture, args: &[&str]) -> Result<Command, CommandError> {
    if args.len() != 2 {
        return Err(CommandError("expected X Y".to_string()));
    }
    Ok(Command::Pointer {
        gesture,
        at: point(args[0], args[1])?,
    })
}

fn arity(verb: &str, args: &[&str], n: usize) -> Result<(), CommandError> {
    if args.len() != n {
        return Err(CommandError(format!(
            "`{verb}` takes {n} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn coordinate(s: &str) -> Result<f64, CommandError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError(format!("`{s}` is not a coordinate")))
}

fn point(x: &str, y: &str) -> Result<MapPoint, CommandError> {
    Ok(MapPoint::new(coordinate(x)?, coordinate(y)?))
}

fn number<T: std::str::FromStr>(s: &str) -> Result<T, CommandError> {
    s.parse()
        .map_err(|_| CommandError(format!("`{s}` is not a non-negative integer")))
}

/// Runs a parsed command and returns the text to show the operator.
///
/// `Quit` is left to the caller.
pub async fn execute(session: &mut Session, command: Command) -> String {
    match command {
        Command::Status => status_line(session),
        Command::Resolution(resolution) => {
            session.set_resolution(resolution);
            format!("resolution: {} units/px", resolution.units_per_px())
        }
        Command::Tile {
            bbox,
            width_px,
            height_px,
        } => session
            .gateway()
            .tile_url(bbox, width_px, height_px)
            .unwrap_or_else(|| "invalid WMS URL".to_string()),
        Command::Quit => String::new(),
        command => {
            let resolution = session.resolution();
            match command.into_event(resolution) {
                Some(event) => {
                    let transition = session.dispatch(event).await;
                    format!("mode: {}", transition.mode)
                }
                None => String::new(),
            }
        }
    }
}

pub fn status_line(session: &Session) -> String {
    let machine = session.machine();
    let a = machine.affordances();
    let flag = |on: bool| if on { "on" } else { "off" };
    let mut line = format!(
        "mode: {} | fill: {} | features: {} | save-drawing: {} | save-edit: {} \
         | cancel: {} | draw: {} | resolution: {}",
        machine.mode(),
        machine.fill(),
        machine.overlay().current_features().len(),
        flag(a.save_drawing),
        flag(a.save_edit),
        flag(a.cancel),
        flag(a.draw),
        session.resolution().units_per_px(),
    );
    if let Some(pending) = machine.pending_commit() {
        line.push_str(&format!(" | pending: {}", pending.kind));
    }
    if let Some(value) = session.gateway().cache_buster().value() {
        line.push_str(&format!(" | tiles: _={value}"));
    }
    line
}

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    match notice.count {
        1 => format!("[{tag}] {}", notice.message),
        n => format!("[{tag}] {} (x{n})", notice.message),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_notice, parse_command, Command, PointerGesture};
    use foundation::{Aabb2, Epoch, MapPoint, Resolution};
    use interaction::{Event, FillColor, Notice, Severity};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_pointer_gestures_into_events() {
        let cmd = parse_command("  click 700000 3450000 ").expect("parse").expect("cmd");
        assert_eq!(
            cmd,
            Command::Pointer {
                gesture: PointerGesture::Click,
                at: MapPoint::new(700000.0, 3450000.0)
            }
        );
        let res = Resolution::new(4.0).expect("res");
        assert!(matches!(
            cmd.into_event(res),
            Some(Event::SingleClick { .. })
        ));
        let ctx = parse_command("context 1 2").expect("parse").expect("cmd");
        assert!(matches!(
            ctx.into_event(res),
            Some(Event::SecondaryAction { .. })
        ));
    }

    #[test]
    fn parses_draw_and_edit_commands() {
        assert_eq!(
            parse_command("color black").expect("parse"),
            Some(Command::Event(Event::SelectColor(FillColor::Black)))
        );
        assert_eq!(
            parse_command("move 0 2 5.5 6").expect("parse"),
            Some(Command::Event(Event::MoveVertex {
                ring: 0,
                index: 2,
                to: MapPoint::new(5.5, 6.0)
            }))
        );
        let Some(Command::Event(Event::Reshape { geometry })) =
            parse_command("reshape 0,0 4,0 4,4 0,0").expect("parse")
        else {
            panic!("expected reshape");
        };
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(
            parse_command("tile 0 0 512 512").expect("parse"),
            Some(Command::Tile {
                bbox: Aabb2::new([0.0, 0.0], [512.0, 512.0]),
                width_px: 256,
                height_px: 256
            })
        );
    }

    #[test]
    fn resolution_is_a_view_command_not_an_event() {
        let cmd = parse_command("resolution 0.25").expect("parse").expect("cmd");
        let quarter = Resolution::new(0.25).expect("res");
        assert_eq!(cmd, Command::Resolution(quarter));
        assert_eq!(cmd.into_event(quarter), None);
    }

    #[test]
    fn repeated_notices_show_their_count() {
        let mut notice = Notice {
            epoch: Epoch(3),
            severity: Severity::Warning,
            message: "cancel ignored: a create is still in progress".to_string(),
            count: 1,
        };
        assert_eq!(
            format_notice(&notice),
            "[warning] cancel ignored: a create is still in progress"
        );
        notice.count = 4;
        assert_eq!(
            format_notice(&notice),
            "[warning] cancel ignored: a create is still in progress (x4)"
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   ").expect("parse"), None);
        assert_eq!(parse_command("# note").expect("parse"), None);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse_command("click 1").is_err());
        assert!(parse_command("vertex a b").is_err());
        assert!(parse_command("color purple").is_err());
        assert!(parse_command("move 0 -1 1 1").is_err());
        assert!(parse_command("tile 5 5 1 1").is_err());
        assert!(parse_command("fly").is_err());
        assert!(parse_command("click NaN 1").is_err());
        assert!(parse_command("resolution 0").is_err());
        assert!(parse_command("resolution -3").is_err());
        assert!(parse_command("resolution").is_err());
    }
}
