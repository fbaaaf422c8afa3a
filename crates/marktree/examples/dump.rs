use marktree::MarkdownTree;
use marktree::props::RenderMode;
use marktree::serialize::serialize;
use marktree_core::clock::ManualClock;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

fn main() -> io::Result<()> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut width: u16 = 80;
    let mut base_url: Option<String> = None;
    let mut mode = RenderMode::Live;
    let mut markdown = false;
    let mut links = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                width = parse_u16(&args, &mut i, "--width")?;
            }
            "--base-url" => {
                base_url = Some(parse_string(&args, &mut i, "--base-url")?);
            }
            "--texture" => {
                mode = RenderMode::Texture;
                i += 1;
            }
            "--markdown" => {
                markdown = true;
                i += 1;
            }
            "--links" => {
                links = true;
                i += 1;
            }
            _ => break,
        }
    }

    let input = if i < args.len() {
        let path = &args[i];
        let input = fs::read_to_string(path)?;
        if base_url.is_none()
            && let Some(parent) = Path::new(path).parent()
        {
            let abs = fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());
            base_url = Some(format!("{}/", abs.display()));
        }
        input
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        s
    };

    let mut view = MarkdownTree::new(Box::new(ManualClock::new()));
    view.set_render_mode(mode);
    view.set_base_url(base_url);
    view.set_text(input).map_err(invalid)?;
    view.force_rebuild().map_err(invalid)?;

    if markdown {
        if let Some(doc) = view.ast() {
            print!("{}", serialize(doc));
        }
        return Ok(());
    }

    let size = view.content_size(width);
    let area = Rect::new(0, 0, width, size.height.clamp(0, i32::from(u16::MAX)) as u16);
    let mut buf = Buffer::empty(area);
    view.render_ref(area, &mut buf);
    for y in 0..area.height {
        let row = (0..area.width)
            .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
            .collect::<String>();
        println!("{}", row.trim_end());
    }

    if links {
        println!();
        for zone in view.hit_zones(width).zones() {
            println!(
                "{} ({},{} {}x{}) -> {}",
                zone.target.ref_id,
                zone.rect.x,
                zone.rect.y,
                zone.rect.width,
                zone.rect.height,
                zone.target.url
            );
        }
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        "Usage: dump [options] [path]\n\
\n\
Options:\n\
  --width <n>         Layout width (default: 80)\n\
  --base-url <url>    Resolve relative links/images against this base\n\
  --texture           Paint through a pre-rendered texture\n\
  --markdown          Print the document serialized back to Markdown\n\
  --links             List link hit zones after the render\n\
  -h, --help          Show this help\n\
\n\
If [path] is omitted, reads Markdown from stdin."
    );
}

fn invalid(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

fn parse_u16(args: &[String], i: &mut usize, flag: &str) -> io::Result<u16> {
    let Some(v) = args.get(*i + 1) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} expects a value"),
        ));
    };
    *i += 2;
    v.parse::<u16>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} invalid u16: {e}"),
        )
    })
}

fn parse_string(args: &[String], i: &mut usize, flag: &str) -> io::Result<String> {
    let Some(v) = args.get(*i + 1) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} expects a value"),
        ));
    };
    *i += 2;
    Ok(v.to_string())
}
