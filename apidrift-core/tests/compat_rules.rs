//! End-to-end compatibility rules: streams in, report out.

use apidrift_core::config::{AnalyzerConfig, FilterConfig};
use apidrift_core::filter::{FileMap, FilterPipeline};
use apidrift_core::types::{
    ClassDef, ClassKind, Construct, MemberDef, ModuleStream, ParameterDef, TypeHint, Visibility,
};
use apidrift_core::{analyze, DiffError, OperationCode, Report, Severity};
use proptest::prelude::*;

const MODULE: &str = "Acme_Catalog";

fn stream(constructs: Vec<Construct>) -> Vec<ModuleStream> {
    vec![ModuleStream::new(MODULE, constructs)]
}

fn run(before: Vec<ClassDef>, after: Vec<ClassDef>) -> Report {
    analyze(
        stream(before.into_iter().map(Into::into).collect()),
        stream(after.into_iter().map(Into::into).collect()),
        &AnalyzerConfig::default(),
    )
    .unwrap()
}

fn repo(members: Vec<MemberDef>) -> ClassDef {
    let mut class = ClassDef::new("Acme\\Catalog\\ProductRepository", ClassKind::Class).api();
    class.members = members;
    class
}

fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

fn pair(before: &str, after: &str) -> (FileMap, FileMap) {
    let mut b = FileMap::new();
    let mut a = FileMap::new();
    b.insert("Model/Product.src".to_string(), lines(before));
    a.insert("Model/Product.src".to_string(), lines(after));
    (b, a)
}

fn tag_pipeline() -> FilterPipeline {
    FilterPipeline::new(&FilterConfig::new(&["since", "author"], &["see", "link"]))
}

/// True when the pipeline dropped the pair as noise.
fn filtered_away(before: &str, after: &str) -> bool {
    let (mut b, mut a) = pair(before, after);
    tag_pipeline().run(&mut b, &mut a);
    b.is_empty() && a.is_empty()
}

// Scenario A
#[test]
fn test_removed_public_method_on_api_class_is_major() {
    let report = run(
        vec![repo(vec![MemberDef::method("getById"), MemberDef::method("save")])],
        vec![repo(vec![MemberDef::method("getById")])],
    );
    assert_eq!(report.len(), 1);
    assert_eq!(report.operations[0].code, OperationCode::MethodRemoved);
    assert_eq!(report.operations[0].severity, Severity::Major);
    assert_eq!(
        report.operations[0].target,
        "Acme\\Catalog\\ProductRepository::save()"
    );
}

// Scenario B
#[test]
fn test_appended_optional_parameter_is_minor_only() {
    let before = MemberDef::method("getList").with_params(vec![ParameterDef::required("criteria")]);
    let after = MemberDef::method("getList").with_params(vec![
        ParameterDef::required("criteria"),
        ParameterDef::with_default("storeId", "null"),
    ]);
    let report = run(vec![repo(vec![before])], vec![repo(vec![after])]);
    assert_eq!(report.len(), 1);
    assert_eq!(report.operations[0].code, OperationCode::MethodOptionalParameterAdded);
    assert_eq!(report.max_severity(), Severity::Minor);
    assert_eq!(report.count(Severity::Major), 0);
}

// Scenario C
#[test]
fn test_middle_required_parameter_removed_is_major() {
    let before = MemberDef::method("save").with_params(vec![
        ParameterDef::required("product"),
        ParameterDef::required("storeId"),
        ParameterDef::with_default("saveOptions", "false"),
    ]);
    let after = MemberDef::method("save").with_params(vec![
        ParameterDef::required("product"),
        ParameterDef::with_default("saveOptions", "false"),
    ]);
    let report = run(vec![repo(vec![before])], vec![repo(vec![after])]);
    assert_eq!(report.max_severity(), Severity::Major);
    assert!(report
        .operations
        .iter()
        .any(|op| op.code == OperationCode::MethodParameterRemoved));
}

// Scenario D
#[test]
fn test_doc_comment_spacing_only_is_filtered() {
    let before = "namespace Acme;\n/**\n * Product model.   \n *\n *\n * @api\n */\nclass Product\n{\n\n}\n";
    let after = "namespace Acme;\n/**\n *\n * Product model.\n *\n * @api\n *\n */\nclass Product\n{\n}\n";
    let (mut b, mut a) = pair(before, after);

    let summary = FilterPipeline::new(&FilterConfig::default()).run(&mut b, &mut a);

    assert!(b.is_empty());
    assert!(a.is_empty());
    assert_eq!(summary.removed.len(), 1);
}

// Scenario E
#[test]
fn test_method_still_inherited_from_parent_is_not_removed() {
    let parent = ClassDef::new("Acme\\Catalog\\AbstractRepository", ClassKind::Class)
        .with_member(MemberDef::method("save"));
    let before = repo(vec![MemberDef::method("save")]).extends("Acme\\Catalog\\AbstractRepository");
    let after = repo(vec![]).extends("Acme\\Catalog\\AbstractRepository");

    let report = run(vec![parent.clone(), before], vec![parent, after]);
    assert!(report.is_empty(), "{:?}", report.operations);
}

#[test]
fn test_helpers_of_plain_implementation_are_not_api() {
    let iface = ClassDef::new("Acme\\Catalog\\RepositoryInterface", ClassKind::Interface)
        .api()
        .with_member(MemberDef::method("save"));
    let implementation = |members: Vec<MemberDef>| {
        let mut class = ClassDef::new("Acme\\Catalog\\Repository", ClassKind::Class)
            .implements("Acme\\Catalog\\RepositoryInterface");
        class.members = members;
        class
    };
    let full = implementation(vec![MemberDef::method("save"), MemberDef::method("rebuildIndex")]);
    let slim = implementation(vec![MemberDef::method("save")]);

    let removed = run(vec![iface.clone(), full.clone()], vec![iface.clone(), slim.clone()]);
    assert!(removed.is_empty(), "{:?}", removed.operations);

    let added = run(vec![iface.clone(), slim], vec![iface, full]);
    assert!(added.is_empty(), "{:?}", added.operations);
}

#[test]
fn test_visibility_symmetry() {
    let levels = [Visibility::Public, Visibility::Protected, Visibility::Private];
    let builders: [fn(&'static str) -> MemberDef; 3] = [MemberDef::method, MemberDef::property, MemberDef::constant];

    for build in builders {
        for from in levels {
            for to in levels {
                let member = |v: Visibility| {
                    let mut m = build("value").with_visibility(v);
                    m.is_api = true;
                    m
                };
                let report = run(vec![repo(vec![member(from)])], vec![repo(vec![member(to)])]);
                if to.is_narrower_than(from) {
                    assert_eq!(report.len(), 1, "{} -> {}", from, to);
                    assert_eq!(report.operations[0].severity, Severity::Major);
                } else {
                    assert!(report.is_empty(), "{} -> {}: {:?}", from, to, report.operations);
                }
            }
        }
    }
}

#[test]
fn test_type_hint_move_is_invisible() {
    let method = |param: TypeHint, ret: TypeHint| {
        MemberDef::method("load")
            .with_params(vec![ParameterDef::required("id").typed(param)])
            .with_return(ret)
    };
    let report = run(
        vec![repo(vec![method(TypeHint::native("int"), TypeHint::doc("\\Acme\\Catalog\\Product"))])],
        vec![repo(vec![method(TypeHint::doc("integer"), TypeHint::native("Acme\\Catalog\\Product"))])],
    );
    assert!(report.is_empty(), "{:?}", report.operations);
}

#[test]
fn test_value_ignored_tag_invariants() {
    let doc = |see: &str| format!("/**\n * Load a product.\n{} */\nfunction load() {{}}", see);

    assert!(filtered_away(&doc(" * @see Foo::bar()\n"), &doc(" * @see Baz::qux()\n")));
    assert!(filtered_away(&doc(" * @see Foo\n"), &doc(" * @see\n")));
    assert!(!filtered_away(&doc(" * @see Foo\n"), &doc("")));
    assert!(!filtered_away(&doc(""), &doc(" * @see Foo\n")));
}

#[test]
fn test_fully_ignored_tag_invariants() {
    let doc = |since: &str| format!("/**\n * Load a product.\n{} */\nfunction load() {{}}", since);

    assert!(filtered_away(&doc(" * @since 2.1.0\n"), &doc(" * @since 2.4.0\n")));
    assert!(filtered_away(&doc(" * @since 2.1.0\n"), &doc("")));
    assert!(filtered_away(&doc(""), &doc(" * @Since 2.4.0\n * @author Jane\n")));
}

#[test]
fn test_other_tags_compare_verbatim() {
    let doc = |tag: &str| format!("/**\n{}\n */", tag);
    assert!(!filtered_away(&doc(" * @deprecated 2.4.0"), &doc(" * @deprecated 2.5.0")));
}

#[test]
fn test_single_sided_files_pass_through() {
    let mut b = FileMap::new();
    let mut a = FileMap::new();
    b.insert("Old.src".to_string(), lines("/**\n *\n */  \n"));
    a.insert("New.src".to_string(), lines("x  "));

    tag_pipeline().run(&mut b, &mut a);

    assert_eq!(b["Old.src"], lines("/**\n *\n */  \n"));
    assert_eq!(a["New.src"], vec!["x  "]);
}

#[test]
fn test_duplicate_key_aborts_the_run() {
    let err = analyze(
        stream(vec![repo(vec![]).into(), repo(vec![]).into()]),
        stream(vec![]),
        &AnalyzerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DiffError::DuplicateKey { .. }));
}

#[test]
fn test_cycle_aborts_the_run() {
    let a = ClassDef::new("Acme\\A", ClassKind::Class).extends("Acme\\B");
    let b = ClassDef::new("Acme\\B", ClassKind::Class).implements("Acme\\A");
    let err = analyze(
        stream(vec![]),
        stream(vec![a.into(), b.into()]),
        &AnalyzerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DiffError::HierarchyCycle { .. }));
}

#[test]
fn test_report_order_is_deterministic() {
    let before = vec![
        repo(vec![MemberDef::method("a"), MemberDef::method("b")]),
        ClassDef::new("Acme\\Catalog\\Alpha", ClassKind::Interface).api(),
    ];
    let after = vec![repo(vec![])];
    let first = run(before.clone(), after.clone());
    let second = run(before, after);

    let targets: Vec<&str> = first.operations.iter().map(|o| o.target.as_str()).collect();
    assert_eq!(
        targets,
        vec![
            "Acme\\Catalog\\Alpha",
            "Acme\\Catalog\\ProductRepository::a()",
            "Acme\\Catalog\\ProductRepository::b()",
        ]
    );
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

fn doc_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/**".to_string()),
        Just("    /**   ".to_string()),
        Just(" * Summary line".to_string()),
        Just(" *".to_string()),
        Just(" *   ".to_string()),
        Just(String::new()),
        Just("   ".to_string()),
        Just(" * @since 2.1.0".to_string()),
        Just(" * @see Foo::bar()".to_string()),
        Just(" * @param int $id".to_string()),
        Just(" *   continued text".to_string()),
        Just(" * @ broken".to_string()),
        Just(" */".to_string()),
        Just(" * @since 3 */".to_string()),
        Just("/** @see Other */".to_string()),
        Just("public function load($id);  ".to_string()),
    ]
}

fn file() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(doc_line(), 0..24)
}

proptest! {
    #[test]
    fn filtering_twice_equals_filtering_once(before in file(), after in file()) {
        let pipeline = tag_pipeline();
        let mut b = FileMap::new();
        let mut a = FileMap::new();
        b.insert("A.src".to_string(), before);
        a.insert("A.src".to_string(), after);

        pipeline.run(&mut b, &mut a);
        let (once_b, once_a) = (b.clone(), a.clone());
        pipeline.run(&mut b, &mut a);

        prop_assert_eq!(b, once_b);
        prop_assert_eq!(a, once_a);
    }
}
