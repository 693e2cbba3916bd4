use glam::DVec2;
use svgscene::nodes::{Node, Rect, SceneTree, SvgNode, Text};
use svgscene::renderer::text::measure_text;
use svgscene::renderer::{GlyphRun, GradientShape, RenderContext, SurfacePaint};
use svgscene::{
    Color, Command, Document, RecordingSurface, RenderError, RenderOptions, Renderer, Size,
    SvgLoader,
};

fn load(source: &str) -> Document {
    SvgLoader::new()
        .try_load_str(source)
        .unwrap_or_else(|e| panic!("failed to load: {e}"))
}

fn record(doc: &Document) -> RecordingSurface {
    let mut surface = RecordingSurface::new();
    doc.render(&mut surface, &RenderOptions::default())
        .unwrap_or_else(|e| panic!("render failed: {e}"));
    surface
}

fn fills(surface: &RecordingSurface) -> Vec<&SurfacePaint> {
    surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Fill { paint, .. } => Some(paint),
            _ => None,
        })
        .collect()
}

fn glyph_runs(surface: &RecordingSurface) -> Vec<(&GlyphRun, glam::DAffine2)> {
    surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::GlyphRun { run, transform, .. } => Some((run, *transform)),
            _ => None,
        })
        .collect()
}

fn position(names: &[&str], name: &str) -> usize {
    names
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("no {name} in {names:?}"))
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn middle_anchor_shifts_by_half_the_width() {
    let doc = load(
        r#"<svg width="200" height="50">
             <text x="100" y="30">AB</text>
             <text x="100" y="30" text-anchor="middle">AB</text>
           </svg>"#,
    );
    let surface = record(&doc);
    let runs = glyph_runs(&surface);
    assert_eq!(runs.len(), 2);

    let (start_run, start_transform) = runs[0];
    let (middle_run, middle_transform) = runs[1];
    // Both passes lay out the same glyphs; only the transform moves
    assert_eq!(start_run.glyphs, middle_run.glyphs);

    let first = &start_run.glyphs[0];
    let last = &start_run.glyphs[start_run.glyphs.len() - 1];
    let width = last.origin.x + last.advance - first.origin.x;
    let shift = middle_transform.translation - start_transform.translation;
    assert!((shift.x + width / 2.0).abs() < 1e-9, "shift {shift:?}, width {width}");
    assert_eq!(shift.y, 0.0);
}

#[test]
fn measuring_is_repeatable() {
    let doc = load(r#"<svg><text x="3" y="20" text-anchor="end">Hello <tspan font-weight="bold">world</tspan></text></svg>"#);
    let text = doc.tree().children(doc.root_id())[0];
    let node = doc.tree().node(text);
    let (Some(segment), Some(renderable)) = (node.as_text_segment(), node.as_renderable()) else {
        panic!("expected a text element");
    };
    let ctx = RenderContext::root(doc.size(), &RenderOptions::default()).derive(renderable);

    let before = measure_text(doc.tree(), text, segment, &ctx).unwrap();
    record(&doc);
    let after = measure_text(doc.tree(), text, segment, &ctx).unwrap();
    assert_eq!(before, after);
    assert!(before.width() > 0.0);
}

#[test]
fn end_anchor_inherits_from_the_parent() {
    let doc = load(
        r#"<svg text-anchor="end"><text x="50" y="10">W</text><text x="50" y="10" text-anchor="start">W</text></svg>"#,
    );
    let surface = record(&doc);
    let runs = glyph_runs(&surface);
    let advance = runs[0].0.glyphs[0].advance;
    let shift = runs[0].1.translation - runs[1].1.translation;
    assert!((shift.x + advance).abs() < 1e-9);
}

#[test]
fn tspans_continue_the_pen() {
    let doc = load(r#"<svg><text x="10" y="20">ab<tspan dy="5">cd</tspan>e</text></svg>"#);
    let surface = record(&doc);
    let runs = glyph_runs(&surface);
    assert_eq!(runs.len(), 3);
    let text: String = runs.iter().map(|(run, _)| run.text()).collect();
    assert_eq!(text, "abcde");

    let ab = &runs[0].0.glyphs;
    let cd = &runs[1].0.glyphs;
    let e = &runs[2].0.glyphs;
    assert_eq!(ab[0].origin, DVec2::new(10.0, 20.0));
    assert!((cd[0].origin.x - (ab[1].origin.x + ab[1].advance)).abs() < 1e-9);
    assert_eq!(cd[0].origin.y, 25.0);
    // The shifted baseline stays in effect after the span
    assert_eq!(e[0].origin.y, 25.0);
}

#[test]
fn text_path_places_glyphs_on_the_path() {
    let doc = load(
        r##"<svg>
              <defs><path id="p" d="M0 50 L200 50"/></defs>
              <text><textPath href="#p" startOffset="10">Hi</textPath></text>
            </svg>"##,
    );
    let surface = record(&doc);
    let runs = glyph_runs(&surface);
    assert_eq!(runs.len(), 1);
    let glyphs = &runs[0].0.glyphs;
    assert_eq!(glyphs.len(), 2);
    assert!((glyphs[0].origin.x - 10.0).abs() < 1e-9);
    assert!((glyphs[0].origin.y - 50.0).abs() < 1e-9);
    assert!(glyphs[0].angle.abs() < 1e-9);
}

#[test]
fn invisible_spans_are_skipped() {
    let doc = load(r#"<svg><text>a<tspan visibility="hidden">b</tspan>c</text></svg>"#);
    let surface = record(&doc);
    let text: String = glyph_runs(&surface)
        .iter()
        .map(|(run, _)| run.text())
        .collect();
    assert_eq!(text, "ac");
}

#[test]
fn shapes_inside_text_are_rejected_at_render_time() {
    // The loader never links a rect under text, so build the tree by hand
    let mut tree = SceneTree::new();
    let text = tree.push(Node::Text(Text::default()), None);
    let rect = tree.push(Node::Rect(Rect::default()), None);
    tree.link(text, rect);

    let mut surface = RecordingSurface::new();
    let ctx = RenderContext::root(Size::new(100.0, 100.0), &RenderOptions::default());
    let err = Renderer::new(&tree, &mut surface)
        .render_node(text, &ctx)
        .unwrap_err();
    assert_eq!(err, RenderError::UnsupportedTextSegment { tag: "rect" });
}

// ============================================================================
// Paint servers
// ============================================================================

#[test]
fn single_stop_gradient_is_a_solid_color() {
    let doc = load(
        r##"<svg>
              <linearGradient id="g"><stop offset="0.5" stop-color="#00ff00"/></linearGradient>
              <rect width="10" height="10" fill="url(#g)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    assert_eq!(fills(&surface), vec![&SurfacePaint::Color(Color::rgb(0, 255, 0))]);
}

#[test]
fn gradient_without_stops_paints_nothing() {
    let doc = load(
        r##"<svg>
              <linearGradient id="g"/>
              <rect width="10" height="10" fill="url(#g) red"/>
            </svg>"##,
    );
    let surface = record(&doc);
    assert!(fills(&surface).is_empty());
}

#[test]
fn missing_server_uses_the_fallback() {
    let doc = load(r##"<svg><rect width="10" height="10" fill="url(#nowhere) blue"/></svg>"##);
    let surface = record(&doc);
    assert_eq!(fills(&surface), vec![&SurfacePaint::Color(Color::rgb(0, 0, 255))]);
}

#[test]
fn stops_are_inherited_through_href() {
    let doc = load(
        r##"<svg>
              <linearGradient id="base">
                <stop offset="0" stop-color="red"/>
                <stop offset="1" stop-color="blue"/>
              </linearGradient>
              <linearGradient id="derived" href="#base" x2="0" y2="1"/>
              <rect x="10" y="20" width="30" height="40" fill="url(#derived)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let paints = fills(&surface);
    let [SurfacePaint::Gradient(gradient)] = paints.as_slice() else {
        panic!("expected one gradient fill, got {paints:?}");
    };
    assert_eq!(gradient.stops.len(), 2);
    assert_eq!(gradient.stops[1].color, Color::rgb(0, 0, 255));
    let GradientShape::Linear { start, end } = gradient.shape else {
        panic!("expected a linear gradient");
    };
    // Bounding box units map the unit square onto the rect
    assert_eq!(gradient.transform.transform_point2(start), DVec2::new(10.0, 20.0));
    assert_eq!(gradient.transform.transform_point2(end), DVec2::new(10.0, 60.0));
}

#[test]
fn gradient_href_cycles_terminate() {
    let doc = load(
        r##"<svg>
              <linearGradient id="a" href="#b"/>
              <linearGradient id="b" href="#a"/>
              <rect width="10" height="10" fill="url(#a)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    assert!(fills(&surface).is_empty());
}

// ============================================================================
// References and effects
// ============================================================================

#[test]
fn self_referencing_use_is_a_cycle() {
    let doc = load(r##"<svg><g id="a"><use href="#a"/></g></svg>"##);
    let mut surface = RecordingSurface::new();
    let err = doc
        .render(&mut surface, &RenderOptions::default())
        .unwrap_err();
    assert_eq!(err, RenderError::ReferenceCycle { tag: "use" });
}

#[test]
fn one_node_renders_once_per_reference() {
    let doc = load(
        r##"<svg>
              <defs><rect id="r" width="4" height="4"/></defs>
              <use href="#r" fill="red"/>
              <use href="#r" x="5" fill="blue"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let drawn: Vec<(SurfacePaint, DVec2)> = surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Fill { paint, transform, .. } => Some((paint.clone(), transform.translation)),
            _ => None,
        })
        .collect();
    assert_eq!(
        drawn,
        vec![
            (SurfacePaint::Color(Color::rgb(255, 0, 0)), DVec2::ZERO),
            (SurfacePaint::Color(Color::rgb(0, 0, 255)), DVec2::new(5.0, 0.0)),
        ]
    );

    // Rendering leaves the shared node as it was
    assert_eq!(record(&doc).commands(), surface.commands());
}

#[test]
fn use_instantiates_symbols_into_its_viewport() {
    let doc = load(
        r##"<svg>
              <symbol id="s" viewBox="0 0 10 10"><rect width="10" height="10"/></symbol>
              <use href="#s" x="5" width="20" height="20"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let transform = surface
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::Fill { transform, .. } => Some(*transform),
            _ => None,
        })
        .unwrap();
    assert_eq!(transform.transform_point2(DVec2::new(10.0, 10.0)), DVec2::new(25.0, 20.0));
}

#[test]
fn markers_are_drawn_at_every_vertex() {
    let doc = load(
        r##"<svg>
              <marker id="m" markerWidth="4" markerHeight="4"><rect width="2" height="2"/></marker>
              <path d="M0 0 L10 0 L20 0" stroke="black"
                    marker-start="url(#m)" marker-mid="url(#m)" marker-end="url(#m)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let names = surface.names();
    // Fill and stroke of the path, then one rect per vertex
    assert_eq!(surface.draws().count(), 5);
    assert!(position(&names, "stroke") < position(&names, "clip"));
}

#[test]
fn group_opacity_uses_a_layer() {
    let doc = load(r#"<svg><g opacity="0.5"><rect width="1" height="1"/></g></svg>"#);
    let surface = record(&doc);
    let names = surface.names();
    let push = position(&names, "push-layer");
    let fill = position(&names, "fill");
    let pop = position(&names, "pop-layer");
    assert!(push < fill && fill < pop);
    assert!(matches!(
        surface.commands()[push],
        Command::PushLayer { opacity, filter: None } if opacity == 0.5
    ));
}

#[test]
fn transparent_elements_are_skipped() {
    let doc = load(r#"<svg><rect width="1" height="1" opacity="0"/></svg>"#);
    assert_eq!(record(&doc).draws().count(), 0);
}

#[test]
fn clip_paths_clip_before_drawing() {
    let doc = load(
        r##"<svg>
              <clipPath id="c"><rect width="5" height="5"/></clipPath>
              <rect width="10" height="10" clip-path="url(#c)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let names = surface.names();
    assert!(position(&names, "clip") < position(&names, "fill"));
    // The clip path content itself is never drawn
    assert_eq!(surface.draws().count(), 1);
}

#[test]
fn clip_paths_follow_use_to_its_shape() {
    let doc = load(
        r##"<svg>
              <defs><rect id="r" width="4" height="4"/></defs>
              <clipPath id="c"><use href="#r" x="10" y="2"/></clipPath>
              <rect width="20" height="20" clip-path="url(#c)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let Some(Command::Clip { path, .. }) = surface.commands().iter().find(|c| c.name() == "clip")
    else {
        panic!("expected a clip in {:?}", surface.names());
    };
    let bounds = path.bounds();
    assert_eq!(bounds.min, DVec2::new(10.0, 2.0));
    assert_eq!(bounds.max, DVec2::new(14.0, 6.0));
}

#[test]
fn masks_wrap_the_content() {
    let doc = load(
        r##"<svg>
              <mask id="m"><rect width="5" height="5" fill="white"/></mask>
              <rect width="10" height="10" mask="url(#m)"/>
            </svg>"##,
    );
    let surface = record(&doc);
    let names = surface.names();
    let push = position(&names, "push-mask");
    let commit = position(&names, "commit-mask");
    let pop = position(&names, "pop-mask");
    assert!(push < commit && commit < pop);
    // Mask content, then the masked rect
    assert_eq!(surface.draws().count(), 2);
}

#[test]
fn display_none_hides_the_subtree() {
    let doc = load(r#"<svg><g display="none"><rect width="1" height="1"/></g></svg>"#);
    assert_eq!(record(&doc).draws().count(), 0);
}

#[test]
fn explicit_viewport_scales_the_view_box() {
    let doc = load(r#"<svg viewBox="0 0 10 10"><rect width="10" height="10"/></svg>"#);
    let mut surface = RecordingSurface::new();
    let options = RenderOptions::default().with_viewport(Size::new(100.0, 100.0));
    doc.render(&mut surface, &options).unwrap();
    let Command::Fill { transform, .. } = surface.draws().next().unwrap() else {
        panic!("expected a fill");
    };
    assert_eq!(transform.transform_point2(DVec2::new(10.0, 10.0)), DVec2::new(100.0, 100.0));
}

#[test]
fn replay_reproduces_the_recording() {
    let doc = load(r#"<svg><g opacity="0.5"><circle r="3"/><text y="10">x</text></g></svg>"#);
    let original = record(&doc);
    let mut copy = RecordingSurface::new();
    original.replay(&mut copy);
    assert_eq!(original.names(), copy.names());
}
