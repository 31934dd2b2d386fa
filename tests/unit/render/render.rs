use std::cell::RefCell;
use std::io::Cursor;

use super::*;
use crate::foundation::error::ThumbError;

/// Writes a 2x1 PNG (one opaque red pixel, one transparent pixel) and remembers what it saw.
#[derive(Default)]
struct RecordingRasterizer {
    seen: RefCell<Vec<(PathBuf, String)>>,
}

impl Rasterize for RecordingRasterizer {
    fn rasterize(&self, svg_path: &Path, png_path: &Path) -> ThumbResult<()> {
        let svg = std::fs::read_to_string(svg_path).unwrap();
        self.seen.borrow_mut().push((svg_path.to_path_buf(), svg));
        let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 0]).unwrap();
        img.save_with_format(png_path, image::ImageFormat::Png)
            .map_err(|e| ThumbError::renderer(e.to_string()))
    }
}

impl RecordingRasterizer {
    fn last_svg_path(&self) -> PathBuf {
        self.seen.borrow().last().unwrap().0.clone()
    }
}

struct FailingRasterizer {
    seen: RefCell<Option<PathBuf>>,
}

impl Rasterize for FailingRasterizer {
    fn rasterize(&self, svg_path: &Path, _png_path: &Path) -> ThumbResult<()> {
        *self.seen.borrow_mut() = Some(svg_path.to_path_buf());
        Err(ThumbError::renderer("exit status 1"))
    }
}

struct GarbageRasterizer;

impl Rasterize for GarbageRasterizer {
    fn rasterize(&self, _svg_path: &Path, png_path: &Path) -> ThumbResult<()> {
        std::fs::write(png_path, b"not a png").unwrap();
        Ok(())
    }
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

#[test]
fn file_name_is_iso_date_and_dashed_time() {
    assert_eq!(
        output_file_name(date("2024-01-07"), "10:30", OutputFormat::Png),
        "2024-01-07.10-30.png"
    );
    assert_eq!(
        output_file_name(date("2024-12-24"), "18:00:00", OutputFormat::Jpg),
        "2024-12-24.18-00-00.jpg"
    );
}

#[test]
fn png_output_is_written_directly_and_scratch_is_removed() {
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("a.png");
    let renderer = ThumbnailRenderer::new(RecordingRasterizer::default());

    renderer.render("<svg>7. Jan</svg>", &out, OutputFormat::Png).unwrap();

    let img = image::open(&out).unwrap();
    assert_eq!((img.width(), img.height()), (2, 1));

    let seen = renderer.rasterizer().seen.borrow();
    assert_eq!(seen[0].1, "<svg>7. Jan</svg>");
    let svg_path = &seen[0].0;
    assert!(!svg_path.exists());
    assert!(!svg_path.parent().unwrap().exists());
    assert!(
        svg_path
            .parent()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TEMP_PREFIX)
    );
}

#[test]
fn renderer_failure_still_removes_temp_document() {
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("a.png");
    let renderer = ThumbnailRenderer::new(FailingRasterizer {
        seen: RefCell::new(None),
    });

    let err = renderer.render("<svg/>", &out, OutputFormat::Jpg).unwrap_err();
    assert!(matches!(err, ThumbError::Renderer(_)));

    let svg_path = renderer.rasterizer().seen.borrow().clone().unwrap();
    assert!(!svg_path.exists());
    assert!(!out.exists());
}

#[test]
fn jpg_output_is_converted_and_intermediate_removed() {
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("nested").join("a.jpg");
    let renderer = ThumbnailRenderer::new(RecordingRasterizer::default());

    renderer.render("<svg/>", &out, OutputFormat::Jpg).unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
    let scratch = renderer.rasterizer().last_svg_path();
    assert!(!scratch.parent().unwrap().join(RASTER_FILE).exists());
    assert!(!scratch.parent().unwrap().exists());
}

#[test]
fn webp_and_bmp_outputs_decode() {
    let out_dir = tempfile::tempdir().unwrap();
    let renderer = ThumbnailRenderer::new(RecordingRasterizer::default());

    for format in [OutputFormat::Webp, OutputFormat::Bmp] {
        let out = out_dir.path().join(format!("a.{format}"));
        renderer.render("<svg/>", &out, format).unwrap();
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), format.image_format());
        let img = image::load(Cursor::new(bytes), format.image_format()).unwrap();
        assert_eq!((img.width(), img.height()), (2, 1));
    }
}

#[test]
fn conversion_failure_leaves_no_output_or_temp_files() {
    let out_dir = tempfile::tempdir().unwrap();
    let temp_root = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("a.jpg");
    let renderer = ThumbnailRenderer::with_opts(
        GarbageRasterizer,
        RenderOpts {
            temp_root: Some(temp_root.path().to_path_buf()),
            ..RenderOpts::default()
        },
    );

    let err = renderer.render("<svg/>", &out, OutputFormat::Jpg).unwrap_err();
    assert!(matches!(err, ThumbError::Conversion(_)), "{err}");
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
}

#[test]
fn flatten_straight_alpha_over_background() {
    let src = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 128, 9, 8, 7, 255]).unwrap();
    let out = convert::flatten_over_bg(&src, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(0, 0).0, [128, 0, 0]);
    assert_eq!(out.get_pixel(1, 0).0, [9, 8, 7]);

    let out = convert::flatten_over_bg(&src, [255, 255, 255, 255]);
    assert_eq!(out.get_pixel(0, 0).0, [255, 127, 127]);
}

#[test]
fn missing_executable_is_a_renderer_failure() {
    let out_dir = tempfile::tempdir().unwrap();
    let rasterizer = ExternalRasterizer::new(out_dir.path().join("no-such-rasterizer"));
    let renderer = ThumbnailRenderer::new(&rasterizer);

    let err = renderer
        .render("<svg/>", &out_dir.path().join("a.png"), OutputFormat::Png)
        .unwrap_err();
    assert!(matches!(err, ThumbError::Renderer(_)));
    assert!(err.to_string().contains("failed to spawn rasterizer"));
    assert!(rasterizer.probe().is_err());
}

#[test]
fn default_timeout_is_bounded() {
    let r = ExternalRasterizer::new("inkscape");
    assert_eq!(r.timeout(), Some(DEFAULT_RASTERIZER_TIMEOUT));
    assert_eq!(r.with_timeout(None).timeout(), None);
}

/// Child whose status polling always fails; remembers being killed and reaped.
#[derive(Default)]
struct UnpollableChild {
    killed: bool,
    reaped: bool,
}

impl rasterizer::ChildProcess for UnpollableChild {
    fn try_wait(&mut self) -> std::io::Result<Option<std::process::ExitStatus>> {
        Err(std::io::Error::other("status unavailable"))
    }

    fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.reaped = true;
        Err(std::io::Error::other("status unavailable"))
    }

    fn kill(&mut self) -> std::io::Result<()> {
        self.killed = true;
        Ok(())
    }
}

#[test]
fn polling_failure_kills_and_reaps_the_child() {
    let mut child = UnpollableChild::default();
    let err = rasterizer::wait_with_timeout(&mut child, Some(std::time::Duration::from_secs(5)))
        .unwrap_err();

    assert!(matches!(err, ThumbError::Renderer(_)));
    assert!(err.to_string().contains("status unavailable"), "{err}");
    assert!(child.killed);
    assert!(child.reaped);
}

#[test]
fn stderr_collection_stops_at_deadline_while_writer_is_alive() {
    use std::time::{Duration, Instant};

    let (tx, rx) = std::sync::mpsc::channel();
    tx.send(b"partial ".to_vec()).unwrap();
    tx.send(b"output".to_vec()).unwrap();

    let started = Instant::now();
    let (bytes, complete) =
        rasterizer::collect_stderr(&rx, Instant::now() + Duration::from_millis(100));
    assert_eq!(bytes, b"partial output");
    assert!(!complete);
    assert!(started.elapsed() < Duration::from_secs(2));

    tx.send(b"!".to_vec()).unwrap();
    drop(tx);
    let (bytes, complete) =
        rasterizer::collect_stderr(&rx, Instant::now() + Duration::from_secs(5));
    assert_eq!(bytes, b"!");
    assert!(complete);
}

#[cfg(unix)]
mod external {
    use std::os::unix::fs::PermissionsExt as _;
    use std::time::{Duration, Instant};

    use super::*;
use crate::foundation::error::ThumbError;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("rasterizer.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn non_zero_exit_reports_status_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "echo \"cannot open $1\" >&2\nexit 3");
        let renderer = ThumbnailRenderer::new(ExternalRasterizer::new(exe));

        let err = renderer
            .render("<svg/>", &dir.path().join("a.png"), OutputFormat::Png)
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ThumbError::Renderer(_)));
        assert!(msg.contains("cannot open"), "{msg}");
        assert!(msg.contains("document.svg"), "{msg}");
    }

    #[test]
    fn arguments_follow_input_dash_o_output() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        let exe = script(
            dir.path(),
            &format!(
                "echo \"$2\" > '{}'\ncp \"$1\" \"$3\"",
                args_file.display()
            ),
        );
        let out = dir.path().join("copy.png");
        ThumbnailRenderer::new(ExternalRasterizer::new(exe))
            .render("<svg>hello</svg>", &out, OutputFormat::Png)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&args_file).unwrap().trim(), "-o");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<svg>hello</svg>");
    }

    #[test]
    fn hung_rasterizer_is_killed_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "exec sleep 10");
        let rasterizer =
            ExternalRasterizer::new(exe).with_timeout(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = ThumbnailRenderer::new(rasterizer)
            .render("<svg/>", &dir.path().join("a.png"), OutputFormat::Png)
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn helper_holding_stderr_open_does_not_block_the_render() {
        let dir = tempfile::tempdir().unwrap();
        // The backgrounded sleep inherits stderr and outlives the script.
        let exe = script(dir.path(), "sleep 5 &\ncp \"$1\" \"$3\"\nexit 0");
        let out = dir.path().join("a.png");

        for timeout in [Some(Duration::from_millis(300)), None] {
            let rasterizer = ExternalRasterizer::new(&exe).with_timeout(timeout);
            let started = Instant::now();
            ThumbnailRenderer::new(rasterizer)
                .render("<svg/>", &out, OutputFormat::Png)
                .unwrap();
            assert!(
                started.elapsed() < Duration::from_secs(3),
                "render took {:?} with timeout {timeout:?}",
                started.elapsed()
            );
            assert!(out.exists());
        }
    }

    #[test]
    fn helper_holding_stderr_open_still_reports_failure_output() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "sleep 5 &\necho 'bad input' >&2\nexit 4");

        let started = Instant::now();
        let err = ThumbnailRenderer::new(ExternalRasterizer::new(exe))
            .render("<svg/>", &dir.path().join("a.png"), OutputFormat::Png)
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(err.to_string().contains("bad input"), "{err}");
    }

    #[test]
    fn probe_returns_first_version_line() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "echo 'Inkscape 1.3.2 (091e20e, 2023-11-25)'\necho extra");
        assert_eq!(
            ExternalRasterizer::new(exe).probe().unwrap(),
            "Inkscape 1.3.2 (091e20e, 2023-11-25)"
        );
    }
}
