use archdiagram::graph_layout::{self, GraphLayout};
use archdiagram::{OutputFormat, RenderOptions, architecture};
use std::fs;

struct Image {
    width: u32,
    rgba: Vec<u8>,
}

impl Image {
    fn decode(bytes: &[u8]) -> Image {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(info.bit_depth, png::BitDepth::Eight);
        buf.truncate(info.buffer_size());
        Image {
            width: info.width,
            rgba: buf,
        }
    }

    /// Dark, text-colored pixels inside the given box.
    fn ink(&self, x: f32, y: f32, w: f32, h: f32) -> usize {
        let height = (self.rgba.len() / 4) as u32 / self.width;
        let (x0, y0) = (x.floor().max(0.0) as u32, y.floor().max(0.0) as u32);
        let x1 = ((x + w).ceil() as u32).min(self.width);
        let y1 = ((y + h).ceil() as u32).min(height);
        let mut count = 0;
        for py in y0..y1 {
            for px in x0..x1 {
                let i = ((py * self.width + px) * 4) as usize;
                let p = &self.rgba[i..i + 4];
                if p[3] > 0 && p[0] < 128 && p[1] < 128 && p[2] < 128 {
                    count += 1;
                }
            }
        }
        count
    }
}

fn architecture_png() -> (GraphLayout, Image) {
    let tmp = tempfile::tempdir().unwrap();
    let diagram = architecture::token_management().unwrap();
    let layout = graph_layout::compute(&diagram).unwrap();
    let path = archdiagram::render_to_dir(
        &diagram,
        tmp.path(),
        architecture::FILE_STEM,
        &RenderOptions::default(),
    )
    .unwrap();
    (layout, Image::decode(&fs::read(path).unwrap()))
}

#[test]
fn render_to_dir_keeps_working_directory() {
    let before = std::env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();

    let diagram = architecture::token_management().unwrap();
    let path = archdiagram::render_to_dir(
        &diagram,
        tmp.path(),
        architecture::FILE_STEM,
        &RenderOptions::default(),
    )
    .unwrap();

    assert_eq!(std::env::current_dir().unwrap(), before);
    assert_eq!(path, tmp.path().join("architecture.png"));
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn render_to_dir_uses_format_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let diagram = architecture::token_management().unwrap();
    let options = RenderOptions {
        format: OutputFormat::Svg,
        ..RenderOptions::default()
    };
    let path = archdiagram::render_to_dir(&diagram, tmp.path(), "diagram", &options).unwrap();
    assert_eq!(path.file_name().unwrap(), "diagram.svg");
}

#[test]
fn render_to_dir_error_leaves_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("architecture.png");
    fs::write(&target, b"previous").unwrap();

    let diagram = architecture::token_management().unwrap();
    let mut options = RenderOptions::default();
    options.raster.scale = -2.0;
    let err = archdiagram::render_to_dir(&diagram, tmp.path(), "architecture", &options)
        .unwrap_err();

    assert!(matches!(err, archdiagram::Error::Raster(_)), "got: {err}");
    assert_eq!(fs::read(&target).unwrap(), b"previous");
}

#[test]
fn png_draws_node_labels() {
    let (layout, image) = architecture_png();
    for node in &layout.nodes {
        let label_top = node.label_y();
        let ink = image.ink(node.x, label_top, node.width, node.y + node.height - label_top);
        assert!(ink > 10, "label {:?} has no ink ({ink} px)", node.label);
    }
}

#[test]
fn png_draws_cluster_titles() {
    let (layout, image) = architecture_png();
    for cluster in &layout.clusters {
        let ink = image.ink(
            cluster.x,
            cluster.y,
            cluster.width.min(120.0),
            graph_layout::CLUSTER_TITLE,
        );
        assert!(ink > 10, "title {:?} has no ink ({ink} px)", cluster.label);
    }
}

#[test]
fn png_background_is_white() {
    let (_, image) = architecture_png();
    assert_eq!(&image.rgba[..4], &[255, 255, 255, 255]);
}

#[cfg(unix)]
#[test]
fn render_to_dir_keeps_file_readable() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("architecture.png");
    fs::write(&target, b"previous").unwrap();
    fs::set_permissions(&target, fs::Permissions::from_mode(0o644)).unwrap();

    let diagram = architecture::token_management().unwrap();
    archdiagram::render_to_dir(&diagram, tmp.path(), "architecture", &RenderOptions::default())
        .unwrap();

    let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}

#[test]
fn render_to_dir_rejects_paths_as_file_stem() {
    let tmp = tempfile::tempdir().unwrap();
    let inner = tmp.path().join("inner");
    fs::create_dir(&inner).unwrap();

    let diagram = architecture::token_management().unwrap();
    for stem in ["../escaped", "", "nested/name"] {
        let err = archdiagram::render_to_dir(&diagram, &inner, stem, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, archdiagram::Error::InvalidFileStem(_)), "got: {err}");
    }
    assert!(fs::read_dir(&inner).unwrap().next().is_none());
    assert!(!tmp.path().join("escaped.png").exists());
}
