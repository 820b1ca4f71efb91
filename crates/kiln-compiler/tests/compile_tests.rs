//! Compile pass tests: caching, cycles, error isolation and output shape.

mod helpers;

use helpers::{Fixture, spec};
use kiln_compiler::{CompileOptions, FatalBuildError, ModuleError, TranspileError};
use kiln_graph::{HashChain, ModuleState};

const APP: &str = "import { lib } from './lib.ts';\nconsole.log(lib);\n";
const LIB: &str = "export const lib = 1;\n";

#[tokio::test]
async fn compiles_module_and_dependencies() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);

    let app = fx
        .compiler
        .compile(&spec("/src/app.ts"), CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(app.state, ModuleState::Ready);
    assert_eq!(app.deps.len(), 1);
    assert_eq!(app.deps[0].target, spec("/src/lib.ts"));
    assert!(app.deps[0].hash_slot.is_some());
    assert!(fx.compiler.graph().module(&spec("/src/lib.ts")).unwrap().is_ready());
    assert_eq!(fx.transpiler.total(), 2);
}

#[tokio::test]
async fn second_compile_is_a_pure_cache_hit() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);
    let root = spec("/src/app.ts");

    let first = fx.compiler.compile_all(&[root.clone()], CompileOptions::default()).await;
    assert!(first.is_clean());
    assert_eq!(first.transpiled, 2);
    let hash = fx.content_hash("/src/app.ts");
    let writes = fx.store.blob_writes();
    let reads = fx.store.blob_reads();

    let second = fx.compiler.compile_all(&[root.clone()], CompileOptions::default()).await;
    assert_eq!(second.transpiled, 0);
    assert_eq!(second.writes, 0);
    assert!(second.changed.is_empty());
    assert_eq!(fx.store.blob_writes(), writes);
    assert_eq!(fx.store.blob_reads(), reads, "a cache hit touches no artifacts");
    assert_eq!(fx.content_hash("/src/app.ts"), hash);
}

#[tokio::test]
async fn forced_refresh_of_unchanged_source_skips_transpile() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);
    let root = spec("/src/app.ts");
    fx.compiler.compile(&root, CompileOptions::default()).await.unwrap();
    let writes = fx.store.blob_writes();

    let report = fx.compiler.compile_all(&[root], CompileOptions::refresh()).await;

    assert_eq!(report.transpiled, 0);
    assert_eq!(report.reused, 1);
    assert_eq!(fx.store.blob_writes(), writes);
}

#[tokio::test]
async fn rewrites_imports_with_dependency_tokens() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);
    fx.compiler
        .compile(&spec("/src/app.ts"), CompileOptions::default())
        .await
        .unwrap();

    let lib_hash = HashChain::source_hash(LIB.as_bytes());
    let expected = format!(
        "import {{ lib }} from '/_kiln/src/lib.ts.js?v={}';\nconsole.log(lib);\n",
        HashChain::token(&lib_hash)
    );
    assert_eq!(fx.artifact("/src/app.ts"), expected);
    assert_eq!(fx.artifact("/src/lib.ts"), LIB);
}

#[tokio::test]
async fn leaf_hash_is_source_hash_and_importer_folds_it() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);
    fx.compiler
        .compile(&spec("/src/app.ts"), CompileOptions::default())
        .await
        .unwrap();

    let x = HashChain::source_hash(APP.as_bytes());
    let y = HashChain::source_hash(LIB.as_bytes());
    assert_eq!(fx.content_hash("/src/lib.ts"), y);
    assert_eq!(fx.content_hash("/src/app.ts"), HashChain::fold(&x, [y.as_str()]));
}

#[tokio::test]
async fn cyclic_imports_settle_without_deadlock() {
    let fx = Fixture::new(&[
        ("/src/a.ts", "import { b } from './b.ts';\nexport const a = 1;\n"),
        ("/src/b.ts", "import { a } from './a.ts';\nexport const b = 2;\n"),
    ]);

    let report = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        fx.compiler.compile_all(&[spec("/src/a.ts")], CompileOptions::default()),
    )
    .await
    .expect("cyclic compile deadlocked");

    assert!(report.is_clean());
    assert_eq!(fx.transpiler.count("/src/a.ts"), 1);
    assert_eq!(fx.transpiler.count("/src/b.ts"), 1);
    for path in ["/src/a.ts", "/src/b.ts"] {
        let module = fx.compiler.graph().module(&spec(path)).unwrap();
        assert_eq!(module.state, ModuleState::Ready, "{path}");
        assert!(!module.content_hash.is_empty());
    }
}

#[tokio::test]
async fn shared_dependency_is_transpiled_once_per_pass() {
    let fx = Fixture::new(&[
        ("/src/a.ts", "import './shared.ts';\nimport './b.ts';\n"),
        ("/src/b.ts", "import './shared.ts';\n"),
        ("/src/shared.ts", "export const s = 1;\n"),
    ]);

    let report = fx
        .compiler
        .compile_all(&[spec("/src/a.ts"), spec("/src/b.ts")], CompileOptions::default())
        .await;

    assert!(report.is_clean());
    assert_eq!(fx.transpiler.count("/src/shared.ts"), 1);
    assert_eq!(fx.transpiler.total(), 3);
}

#[tokio::test]
async fn errored_module_does_not_abort_the_pass() {
    let fx = Fixture::new(&[
        (
            "/src/app.ts",
            "import './good.ts';\nimport './bad.ts';\nimport './gone.ts';\n",
        ),
        ("/src/good.ts", "export const good = 1;\n"),
        ("/src/bad.ts", "export const = ;\n"),
    ]);
    fx.transpiler.fail_on("/src/bad.ts");

    let report = fx
        .compiler
        .compile_all(&[spec("/src/app.ts")], CompileOptions::default())
        .await;

    assert_eq!(report.error_count(), 2);
    assert!(matches!(
        report.outcome(&spec("/src/bad.ts")),
        Some(Err(ModuleError::Transpile {
            source: TranspileError::Failed { .. },
            ..
        }))
    ));
    assert!(report.outcome(&spec("/src/gone.ts")).unwrap().as_ref().unwrap_err().is_not_found());
    assert!(report.outcome(&spec("/src/app.ts")).unwrap().is_ok());
    assert!(report.outcome(&spec("/src/good.ts")).unwrap().is_ok());

    let bad = fx.compiler.graph().module(&spec("/src/bad.ts")).unwrap();
    assert!(matches!(bad.state, ModuleState::Errored(_)));
    assert!(matches!(
        report.ensure_clean(),
        Err(FatalBuildError::ErroredModule { .. })
    ));
}

#[tokio::test]
async fn errored_module_recovers_on_next_change() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);
    fx.transpiler.fail_on("/src/lib.ts");
    fx.compiler
        .compile(&spec("/src/app.ts"), CompileOptions::default())
        .await
        .unwrap();
    assert!(fx.compiler.graph().module(&spec("/src/lib.ts")).unwrap().error().is_some());

    fx.transpiler.recover("/src/lib.ts");
    let outcome = fx.compiler.source_changed(&spec("/src/lib.ts")).await;

    assert!(outcome.report.is_clean());
    assert!(fx.compiler.graph().module(&spec("/src/lib.ts")).unwrap().is_ready());
    let lib_hash = HashChain::source_hash(LIB.as_bytes());
    assert!(fx.artifact("/src/app.ts").contains(HashChain::token(&lib_hash)));
}

#[tokio::test]
async fn unresolvable_bare_import_errors_the_importer() {
    let fx = Fixture::new(&[("/src/app.ts", "import React from 'react';\n")]);

    let result = fx
        .compiler
        .compile(&spec("/src/app.ts"), CompileOptions::default())
        .await;

    assert!(matches!(result, Err(ModuleError::Resolve(_))));
}

#[tokio::test]
async fn ignore_deps_records_edges_without_compiling() {
    let fx = Fixture::new(&[("/src/app.ts", APP), ("/src/lib.ts", LIB)]);

    let options = CompileOptions {
        ignore_deps: true,
        ..CompileOptions::default()
    };
    let app = fx.compiler.compile(&spec("/src/app.ts"), options).await.unwrap();

    assert_eq!(app.deps.len(), 1);
    assert_eq!(fx.transpiler.count("/src/lib.ts"), 0);
    assert!(fx.compiler.graph().module(&spec("/src/lib.ts")).unwrap().is_pending());
}

#[tokio::test]
async fn dynamic_only_imports_are_flagged() {
    let fx = Fixture::new(&[
        ("/src/app.ts", "const page = () => import('./page.ts');\n"),
        ("/src/page.ts", "export default 1;\n"),
    ]);
    fx.compiler
        .compile(&spec("/src/app.ts"), CompileOptions::default())
        .await
        .unwrap();

    let page = fx.compiler.graph().module(&spec("/src/page.ts")).unwrap();
    assert!(page.flags.is_dynamic_entry_only);
    assert!(fx.artifact("/src/app.ts").contains("import('/_kiln/src/page.ts.js')"));
}

#[tokio::test]
async fn identical_sources_get_distinct_artifacts() {
    let fx = Fixture::new(&[
        ("/src/a.ts", "import './x/same.ts';\nimport './y/same.ts';\n"),
        ("/src/x/same.ts", "import './dep.ts';\n"),
        ("/src/x/dep.ts", "export {};\n"),
        ("/src/y/same.ts", "import './dep.ts';\n"),
        ("/src/y/dep.ts", "export {};\n"),
    ]);
    fx.compiler
        .compile(&spec("/src/a.ts"), CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(fx.content_hash("/src/x/same.ts"), fx.content_hash("/src/y/same.ts"));
    assert!(fx.artifact("/src/x/same.ts").contains("/_kiln/src/x/dep.ts.js"));
    assert!(fx.artifact("/src/y/same.ts").contains("/_kiln/src/y/dep.ts.js"));
}
