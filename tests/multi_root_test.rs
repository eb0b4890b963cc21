//! Tests for federated source roots with package-prefix delegation

use std::fs;
use std::path::{Path, PathBuf};

use srcroot::config::{Encoding, ParserConfig};
use srcroot::domain::arena::SyntaxTree;
use srcroot::multi::MultiSourceRoot;
use tempfile::TempDir;

fn write_unit(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    fs::write(&path, content).expect("write unit");
    path
}

fn unit(package: &str, type_name: &str) -> String {
    format!("package {package}\n\ntype {type_name}\n    field label = Ok\nend\n")
}

/// A primary root with one unit in `org.app`, plus a delegate for
/// `com.acme.widgets` with one unit of its own.
struct Federation {
    primary: TempDir,
    widgets: TempDir,
}

impl Federation {
    fn new() -> Self {
        let primary = TempDir::new().expect("tempdir");
        let widgets = TempDir::new().expect("tempdir");
        write_unit(primary.path(), "org/app/Main.unit", &unit("org.app", "Main"));
        write_unit(
            widgets.path(),
            "com/acme/widgets/Button.unit",
            &unit("com.acme.widgets", "Button"),
        );
        Self { primary, widgets }
    }

    fn build(&self) -> MultiSourceRoot {
        MultiSourceRoot::new(
            self.primary.path(),
            None,
            vec![(
                "com.acme.widgets".to_string(),
                self.widgets.path().to_path_buf(),
            )],
        )
    }
}

#[test]
fn given_matching_package_when_parsing_then_delegate_caches_the_unit() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();

    // Act
    let result = mroot
        .try_to_parse("com.acme.widgets", "Button.unit")
        .expect("parse");

    // Assert
    assert!(result.is_successful());
    assert!(mroot.primary().cache().is_empty());
    let (_, delegate) = mroot.delegated_roots().next().expect("delegate");
    assert_eq!(delegate.cache().len(), 1);
}

#[test]
fn given_unmatched_package_when_parsing_then_falls_back_to_primary() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();

    // Act
    let result = mroot.try_to_parse("org.app", "Main.unit").expect("parse");

    // Assert
    assert!(result.is_successful());
    assert_eq!(mroot.primary().cache().len(), 1);
    let (_, delegate) = mroot.delegated_roots().next().expect("delegate");
    assert!(delegate.cache().is_empty());
}

#[test]
fn given_delegates_with_unparsed_files_when_parsing_all_then_only_primary_is_read() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();

    // Act
    let results = mroot.try_to_parse_all().expect("parse all");

    // Assert
    assert_eq!(results.len(), 1);
    let (_, delegate) = mroot.delegated_roots().next().expect("delegate");
    assert!(delegate.cache().is_empty());
}

#[test]
fn given_parsed_federation_when_listing_units_then_primary_first() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();
    mroot
        .try_to_parse_package("com.acme.widgets")
        .expect("parse delegate");
    mroot.try_to_parse_all().expect("parse primary");

    // Act
    let names: Vec<String> = mroot
        .compilation_units()
        .iter()
        .filter_map(|t| t.primary_type_name())
        .collect();

    // Assert: primary's units precede the delegate's despite parse order
    assert_eq!(names, vec!["Main", "Button"]);
    assert_eq!(mroot.cache().len(), 2);
}

#[test]
fn given_two_delegates_when_listing_units_then_registration_order_preserved() {
    // Arrange
    let primary = TempDir::new().expect("tempdir");
    let widgets = TempDir::new().expect("tempdir");
    let io = TempDir::new().expect("tempdir");
    write_unit(primary.path(), "org/app/Main.unit", &unit("org.app", "Main"));
    write_unit(primary.path(), "org/app/Aux.unit", &unit("org.app", "Aux"));
    write_unit(
        widgets.path(),
        "com/acme/widgets/Button.unit",
        &unit("com.acme.widgets", "Button"),
    );
    write_unit(io.path(), "com/acme/io/Pipe.unit", &unit("com.acme.io", "Pipe"));

    let mut mroot = MultiSourceRoot::new(
        primary.path(),
        None,
        vec![
            ("com.acme.widgets".to_string(), widgets.path().to_path_buf()),
            ("com.acme.io".to_string(), io.path().to_path_buf()),
        ],
    );

    // Act: parse in an order unrelated to registration
    mroot.try_to_parse_package("com.acme.io").expect("parse io");
    mroot.try_to_parse_all().expect("parse primary");
    mroot
        .try_to_parse_package("com.acme.widgets")
        .expect("parse widgets");

    // Assert: N1 + N2 + N3 units, primary first, then registration order
    let names: Vec<String> = mroot
        .compilation_units()
        .iter()
        .filter_map(|t| t.primary_type_name())
        .collect();
    assert_eq!(names, vec!["Aux", "Main", "Button", "Pipe"]);
}

#[test]
fn given_target_dir_when_saving_then_delegates_stay_under_their_own_roots() {
    // Arrange
    let federation = Federation::new();
    let target = TempDir::new().expect("tempdir");
    let mut mroot = federation.build();

    let mut primary_unit = SyntaxTree::new();
    primary_unit.set_package("org.app").expect("package");
    primary_unit.add_type("Extra").expect("type");
    mroot.add_unit(primary_unit);

    let mut widget_unit = SyntaxTree::new();
    widget_unit.set_package("com.acme.widgets").expect("package");
    widget_unit.add_type("Grid").expect("type");
    mroot.add_unit(widget_unit);

    // Act
    mroot.save_all_in(target.path()).expect("save");

    // Assert: primary's unit relocates, the delegate's does not
    assert!(target.path().join("org/app/Extra.unit").is_file());
    assert!(!target.path().join("com/acme/widgets/Grid.unit").exists());
    assert!(federation
        .widgets
        .path()
        .join("com/acme/widgets/Grid.unit")
        .is_file());
}

#[test]
fn given_new_config_when_applied_then_every_root_adopts_it() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();
    let latin1 = ParserConfig {
        encoding: Encoding::Latin1,
        ..ParserConfig::default()
    };

    // Act
    mroot.set_parser_config(latin1.clone());

    // Assert
    assert_eq!(mroot.primary().config(), &latin1);
    assert!(mroot
        .delegated_roots()
        .all(|(_, delegate)| delegate.config() == &latin1));
}

#[test]
fn given_per_call_config_when_parsing_via_delegate_then_delegate_adopts_it() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();
    let latin1 = ParserConfig {
        encoding: Encoding::Latin1,
        ..ParserConfig::default()
    };

    // Act
    mroot
        .try_to_parse_with("com.acme.widgets", "Button.unit", &latin1)
        .expect("parse");

    // Assert: the override sticks on the delegate, not on the primary
    let (_, delegate) = mroot.delegated_roots().next().expect("delegate");
    assert_eq!(delegate.config().encoding, Encoding::Latin1);
    assert_eq!(mroot.primary().config().encoding, Encoding::Utf8);
}

#[test]
fn given_built_unit_when_adding_then_routed_by_declared_package() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();
    let mut tree = SyntaxTree::new();
    tree.set_package("com.acme.widgets.grid").expect("package");
    tree.add_type("Cell").expect("type");

    // Act
    mroot.add_unit(tree);

    // Assert
    assert!(mroot.primary().cache().is_empty());
    let (_, delegate) = mroot.delegated_roots().next().expect("delegate");
    assert_eq!(delegate.cache().len(), 1);
}

#[test]
fn given_duplicate_prefix_when_constructing_then_later_root_wins() {
    // Arrange
    let first = TempDir::new().expect("tempdir");
    let second = TempDir::new().expect("tempdir");

    // Act: same prefix up to normalization
    let mroot = MultiSourceRoot::new(
        first.path(),
        None,
        vec![
            ("com.acme".to_string(), first.path().to_path_buf()),
            ("com.acme.".to_string(), second.path().to_path_buf()),
        ],
    );

    // Assert
    let delegates: Vec<(&str, &Path)> = mroot
        .delegated_roots()
        .map(|(prefix, root)| (prefix, root.root()))
        .collect();
    assert_eq!(delegates, vec![("com.acme", second.path())]);
}

#[test]
fn given_empty_package_when_bulk_parsing_then_primary_handles_it() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();

    // Act
    let results = mroot.try_to_parse_package("").expect("parse");

    // Assert
    assert_eq!(results.len(), 1);
    assert_eq!(mroot.primary().cache().len(), 1);
}

#[test]
fn given_encoding_only_save_when_called_then_roots_stay_put_and_reencode() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();

    let mut primary_unit = SyntaxTree::new();
    primary_unit.set_package("org.app").expect("package");
    let ty = primary_unit.add_type("Note").expect("type");
    primary_unit.add_field(ty, "text", "déjà").expect("field");
    mroot.add_unit(primary_unit);

    let mut widget_unit = SyntaxTree::new();
    widget_unit.set_package("com.acme.widgets").expect("package");
    let menu = widget_unit.add_type("Menu").expect("type");
    widget_unit.add_field(menu, "label", "café").expect("field");
    mroot.add_unit(widget_unit);

    // Act: no target directory, just an encoding override
    mroot.save_all_as(Encoding::Latin1).expect("save");

    // Assert: each root writes under its own location, in Latin-1
    let primary_bytes =
        fs::read(federation.primary.path().join("org/app/Note.unit")).expect("read");
    let widget_bytes = fs::read(
        federation
            .widgets
            .path()
            .join("com/acme/widgets/Menu.unit"),
    )
    .expect("read");
    assert!(primary_bytes.contains(&0xE9));
    assert!(widget_bytes.contains(&0xE9));
    assert!(std::str::from_utf8(&widget_bytes).is_err());
}

#[test]
fn given_explicit_encoding_when_saving_then_delegate_writes_honor_it() {
    // Arrange
    let federation = Federation::new();
    let target = TempDir::new().expect("tempdir");
    let mut mroot = federation.build();

    let mut widget_unit = SyntaxTree::new();
    widget_unit.set_package("com.acme.widgets").expect("package");
    let menu = widget_unit.add_type("Menu").expect("type");
    widget_unit.add_field(menu, "label", "café").expect("field");
    mroot.add_unit(widget_unit);

    // Act
    mroot
        .save_all_with(target.path(), Encoding::Latin1)
        .expect("save");

    // Assert: written under the delegate's own root, as Latin-1 bytes
    let saved = federation
        .widgets
        .path()
        .join("com/acme/widgets/Menu.unit");
    let bytes = fs::read(&saved).expect("read saved unit");
    assert!(bytes.contains(&0xE9));
    assert!(std::str::from_utf8(&bytes).is_err());
    assert!(!target.path().join("com/acme/widgets/Menu.unit").exists());
}

#[test]
fn given_custom_printer_when_saving_then_applied_to_every_root() {
    // Arrange
    let federation = Federation::new();
    let mut mroot = federation.build();

    let mut primary_unit = SyntaxTree::new();
    primary_unit.set_package("org.app").expect("package");
    primary_unit.add_type("P").expect("type");
    mroot.add_unit(primary_unit);

    let mut widget_unit = SyntaxTree::new();
    widget_unit.set_package("com.acme.widgets").expect("package");
    widget_unit.add_type("W").expect("type");
    mroot.add_unit(widget_unit);

    mroot.set_printer(std::sync::Arc::new(|_| "# stamped\n".to_string()));

    // Act
    mroot.save_all().expect("save");

    // Assert
    let primary_text =
        fs::read_to_string(federation.primary.path().join("org/app/P.unit")).expect("read");
    let widget_text = fs::read_to_string(
        federation
            .widgets
            .path()
            .join("com/acme/widgets/W.unit"),
    )
    .expect("read");
    assert_eq!(primary_text, "# stamped\n");
    assert_eq!(widget_text, "# stamped\n");
}
