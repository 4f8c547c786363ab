//! Configuration schema definitions
//!
//! Mirrors the SmartOne Android build description: default config, product
//! flavors, build types, signing identities, packaging and lint policy, and
//! declared dependencies. Defaults reproduce the shipped Gradle file, except
//! that release builds carry no signing identity until one is declared.
//!
//! A `[flavors.*]` table replaces that flavor outright. A `[build_types.*]`
//! table only overrides the keys it sets on the stock build type.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Name of the built-in debug signing identity
pub const DEBUG_SIGNING_NAME: &str = "debug";

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Base application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Java and Kotlin compilation settings
    #[serde(default)]
    pub compile: CompileConfig,

    /// Optional Android build features
    #[serde(default)]
    pub build_features: BuildFeaturesConfig,

    /// Product flavors
    #[serde(default)]
    pub flavors: FlavorsConfig,

    /// Build types
    #[serde(default)]
    pub build_types: BuildTypesConfig,

    /// Named signing identities, keyed by name
    #[serde(default)]
    pub signing: BTreeMap<String, SigningIdentity>,

    /// Release-signing switches
    #[serde(default)]
    pub signing_policy: SigningPolicy,

    /// Resource packaging rules
    #[serde(default)]
    pub packaging: PackagingConfig,

    /// Local unit test settings
    #[serde(default)]
    pub test_options: TestOptionsConfig,

    /// Android lint settings
    #[serde(default)]
    pub lint: LintConfig,

    /// Gradle plugin ids applied to the app module, in order
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,

    /// Declared third-party dependencies
    #[serde(default = "default_dependencies")]
    pub dependencies: Vec<DependencySpec>,
}

impl ProjectConfig {
    /// Declare `identity` and point the release build type at it
    pub fn with_release_signing(mut self, identity: SigningIdentity) -> Self {
        self.build_types.release.signing_config = Some(identity.name.clone());
        self.signing.insert(identity.name.clone(), identity);
        self
    }

    /// Look up a signing identity by name, including the built-in debug one
    pub fn signing_identity(&self, name: &str) -> Option<SigningIdentity> {
        match self.signing.get(name) {
            Some(identity) => Some(identity.clone()),
            None if name == DEBUG_SIGNING_NAME => Some(SigningIdentity::debug()),
            None => None,
        }
    }

    /// Whether a plugin id is applied
    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p == id)
    }

    /// Whether any dependency is declared under `configuration`
    pub fn declares(&self, configuration: DependencyConfiguration) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.configuration == configuration)
    }
}

fn default_plugins() -> Vec<String> {
    vec![
        "com.android.application",
        "kotlin-android",
        "kotlin-kapt",
        "kotlin-parcelize",
        "com.google.gms.google-services",
        "com.google.firebase.crashlytics",
        "dev.flutter.flutter-gradle-plugin",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Base application settings (Gradle `defaultConfig`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base application id, before any suffix
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Package of the generated `R` and `BuildConfig` classes
    #[serde(default = "default_application_id")]
    pub namespace: String,

    /// Display name used when a flavor does not override it
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User-visible version, before any suffix
    #[serde(default = "default_version_name")]
    pub version_name: String,

    /// Monotonic store version code
    #[serde(default = "default_version_code")]
    pub version_code: u32,

    /// Lowest supported API level
    #[serde(default = "default_min_sdk")]
    pub min_sdk: u32,

    /// API level the app is tested against
    #[serde(default = "default_target_sdk")]
    pub target_sdk: u32,

    /// API level the app is compiled against
    #[serde(default = "default_target_sdk")]
    pub compile_sdk: u32,

    /// NDK release, `major.minor.build`
    #[serde(default = "default_ndk_version")]
    pub ndk_version: String,

    /// Split dex files past the 64K method limit
    #[serde(default = "default_true")]
    pub multidex_enabled: bool,

    /// Rasterize vector drawables through the support library
    #[serde(default = "default_true")]
    pub vector_drawables_use_support_library: bool,

    /// Runner class for instrumented tests
    #[serde(default = "default_test_instrumentation_runner")]
    pub test_instrumentation_runner: String,

    /// Native ABIs packaged into the app
    #[serde(default = "default_abi_filters")]
    pub abi_filters: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            application_id: default_application_id(),
            namespace: default_application_id(),
            app_name: default_app_name(),
            version_name: default_version_name(),
            version_code: default_version_code(),
            min_sdk: default_min_sdk(),
            target_sdk: default_target_sdk(),
            compile_sdk: default_target_sdk(),
            ndk_version: default_ndk_version(),
            multidex_enabled: true,
            vector_drawables_use_support_library: true,
            test_instrumentation_runner: default_test_instrumentation_runner(),
            abi_filters: default_abi_filters(),
        }
    }
}

fn default_application_id() -> String {
    "com.example.smartone".to_string()
}

fn default_app_name() -> String {
    "SmartOne".to_string()
}

fn default_version_name() -> String {
    "1.0.0".to_string()
}

fn default_version_code() -> u32 {
    1
}

fn default_min_sdk() -> u32 {
    21
}

fn default_target_sdk() -> u32 {
    34
}

fn default_ndk_version() -> String {
    "25.1.8937393".to_string()
}

fn default_test_instrumentation_runner() -> String {
    "androidx.test.runner.AndroidJUnitRunner".to_string()
}

fn default_abi_filters() -> Vec<String> {
    vec!["armeabi-v7a", "arm64-v8a", "x86_64"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

/// Java and Kotlin compilation (Gradle `compileOptions` and `kotlinOptions`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileConfig {
    /// Java language level of the sources
    #[serde(default = "default_java_version")]
    pub java_source_compatibility: String,

    /// Java bytecode level
    #[serde(default = "default_java_version")]
    pub java_target_compatibility: String,

    /// Backport Java 8+ library APIs to older devices
    #[serde(default = "default_true")]
    pub core_library_desugaring: bool,

    /// Kotlin JVM bytecode level
    #[serde(default = "default_java_version")]
    pub kotlin_jvm_target: String,

    /// Extra `freeCompilerArgs` for kotlinc
    #[serde(default = "default_kotlin_compiler_args")]
    pub kotlin_compiler_args: Vec<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            java_source_compatibility: default_java_version(),
            java_target_compatibility: default_java_version(),
            core_library_desugaring: true,
            kotlin_jvm_target: default_java_version(),
            kotlin_compiler_args: default_kotlin_compiler_args(),
        }
    }
}

fn default_java_version() -> String {
    "11".to_string()
}

fn default_kotlin_compiler_args() -> Vec<String> {
    vec!["-Xjvm-default=all".to_string()]
}

/// Optional build features (Gradle `buildFeatures` and `dataBinding`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFeaturesConfig {
    /// Generate view binding classes
    #[serde(default = "default_true")]
    pub view_binding: bool,

    /// Generate the `BuildConfig` class
    #[serde(default = "default_true")]
    pub build_config: bool,

    /// Jetpack Compose compiler
    #[serde(default)]
    pub compose: bool,

    /// Layout data binding
    #[serde(default = "default_true")]
    pub data_binding: bool,
}

impl Default for BuildFeaturesConfig {
    fn default() -> Self {
        Self {
            view_binding: true,
            build_config: true,
            compose: false,
            data_binding: true,
        }
    }
}

/// Local unit test settings (Gradle `testOptions.unitTests`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestOptionsConfig {
    /// Make merged resources and assets visible to unit tests
    #[serde(default = "default_true")]
    pub include_android_resources: bool,

    /// Stubbed `android.jar` methods return defaults instead of throwing
    #[serde(default = "default_true")]
    pub return_default_values: bool,
}

impl Default for TestOptionsConfig {
    fn default() -> Self {
        Self {
            include_android_resources: true,
            return_default_values: true,
        }
    }
}

/// Per-flavor overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FlavorConfig {
    /// Appended to the application id, e.g. `.dev`
    #[serde(default)]
    pub application_id_suffix: Option<String>,

    /// Appended to the version name, e.g. `-dev`
    #[serde(default)]
    pub version_name_suffix: Option<String>,

    /// Display-name override
    #[serde(default)]
    pub app_name: Option<String>,
}

/// The closed set of product flavors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlavorsConfig {
    /// Development branding
    #[serde(default = "default_dev_flavor")]
    pub dev: FlavorConfig,

    /// Store branding
    #[serde(default = "default_prod_flavor")]
    pub prod: FlavorConfig,
}

impl Default for FlavorsConfig {
    fn default() -> Self {
        Self {
            dev: default_dev_flavor(),
            prod: default_prod_flavor(),
        }
    }
}

fn default_dev_flavor() -> FlavorConfig {
    FlavorConfig {
        application_id_suffix: Some(".dev".to_string()),
        version_name_suffix: Some("-dev".to_string()),
        app_name: Some("SmartOne Dev".to_string()),
    }
}

fn default_prod_flavor() -> FlavorConfig {
    FlavorConfig {
        application_id_suffix: None,
        version_name_suffix: None,
        app_name: Some("SmartOne".to_string()),
    }
}

/// Per-build-type settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTypeConfig {
    /// Java debugger may attach
    pub debuggable: bool,
    /// Native debugger may attach
    pub jni_debuggable: bool,
    /// RenderScript kernels built with debug info
    pub renderscript_debuggable: bool,
    /// Code shrinking and obfuscation
    pub minify_enabled: bool,
    /// Drop unreferenced resources (needs `minify_enabled`)
    pub shrink_resources: bool,
    /// Package the `en-XA` and `ar-XB` pseudo-locales
    pub pseudo_locales_enabled: bool,
    /// Recompress PNG resources
    pub crunch_pngs: bool,
    /// R8 rule files, in order
    pub proguard_files: Vec<String>,
    /// Name of a signing identity declared under `[signing]`
    pub signing_config: Option<String>,
    /// Appended after the flavor's application id suffix
    pub application_id_suffix: Option<String>,
    /// Appended after the flavor's version name suffix
    pub version_name_suffix: Option<String>,
}

impl BuildTypeConfig {
    /// Settings of the stock debug build type
    pub fn debug() -> Self {
        Self {
            debuggable: true,
            jni_debuggable: true,
            renderscript_debuggable: true,
            minify_enabled: false,
            shrink_resources: false,
            pseudo_locales_enabled: false,
            crunch_pngs: true,
            proguard_files: default_proguard_files(),
            signing_config: None,
            application_id_suffix: None,
            version_name_suffix: None,
        }
    }

    /// Settings of the stock release build type, unsigned
    pub fn release() -> Self {
        Self {
            debuggable: false,
            jni_debuggable: false,
            renderscript_debuggable: false,
            minify_enabled: true,
            shrink_resources: true,
            pseudo_locales_enabled: true,
            crunch_pngs: true,
            proguard_files: default_proguard_files(),
            signing_config: None,
            application_id_suffix: None,
            version_name_suffix: None,
        }
    }
}

/// Fields a `[build_types.*]` table may set on top of the stock build type
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildTypeOverrides {
    debuggable: Option<bool>,
    jni_debuggable: Option<bool>,
    renderscript_debuggable: Option<bool>,
    minify_enabled: Option<bool>,
    shrink_resources: Option<bool>,
    pseudo_locales_enabled: Option<bool>,
    crunch_pngs: Option<bool>,
    proguard_files: Option<Vec<String>>,
    signing_config: Option<String>,
    application_id_suffix: Option<String>,
    version_name_suffix: Option<String>,
}

impl BuildTypeOverrides {
    fn apply(self, mut base: BuildTypeConfig) -> BuildTypeConfig {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    base.$field = value;
                })*
            };
        }
        overlay!(
            debuggable,
            jni_debuggable,
            renderscript_debuggable,
            minify_enabled,
            shrink_resources,
            pseudo_locales_enabled,
            crunch_pngs,
            proguard_files
        );
        base.signing_config = self.signing_config.or(base.signing_config);
        base.application_id_suffix = self.application_id_suffix.or(base.application_id_suffix);
        base.version_name_suffix = self.version_name_suffix.or(base.version_name_suffix);
        base
    }
}

fn debug_overrides<'de, D>(deserializer: D) -> Result<BuildTypeConfig, D::Error>
where
    D: Deserializer<'de>,
{
    BuildTypeOverrides::deserialize(deserializer).map(|o| o.apply(BuildTypeConfig::debug()))
}

fn release_overrides<'de, D>(deserializer: D) -> Result<BuildTypeConfig, D::Error>
where
    D: Deserializer<'de>,
{
    BuildTypeOverrides::deserialize(deserializer).map(|o| o.apply(BuildTypeConfig::release()))
}

fn default_proguard_files() -> Vec<String> {
    vec!["proguard-android-optimize.txt", "proguard-rules.pro"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// The closed set of build types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildTypesConfig {
    /// Development build type
    #[serde(default = "BuildTypeConfig::debug", deserialize_with = "debug_overrides")]
    pub debug: BuildTypeConfig,

    /// Distribution build type
    #[serde(default = "BuildTypeConfig::release", deserialize_with = "release_overrides")]
    pub release: BuildTypeConfig,
}

impl Default for BuildTypesConfig {
    fn default() -> Self {
        Self {
            debug: BuildTypeConfig::debug(),
            release: BuildTypeConfig::release(),
        }
    }
}

/// Reference to a signing credential
///
/// Passwords are never stored here, only the names of the environment
/// variables that hold them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningIdentity {
    /// Filled from the `[signing.<name>]` key when loaded from TOML
    #[serde(default)]
    pub name: String,

    /// Keystore path; `~` and `$VAR` are expanded
    pub store_file: String,

    /// Key entry inside the keystore
    pub key_alias: String,

    /// Variable holding the keystore password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_password_env: Option<String>,

    /// Variable holding the key password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_password_env: Option<String>,
}

impl SigningIdentity {
    /// Create a named identity
    pub fn new(
        name: impl Into<String>,
        store_file: impl Into<String>,
        key_alias: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            store_file: store_file.into(),
            key_alias: key_alias.into(),
            store_password_env: None,
            key_password_env: None,
        }
    }

    /// Set the environment variables holding the store and key passwords
    pub fn with_password_env(
        mut self,
        store_password_env: impl Into<String>,
        key_password_env: impl Into<String>,
    ) -> Self {
        self.store_password_env = Some(store_password_env.into());
        self.key_password_env = Some(key_password_env.into());
        self
    }

    /// The Android SDK debug keystore
    pub fn debug() -> Self {
        Self::new(DEBUG_SIGNING_NAME, "~/.android/debug.keystore", "androiddebugkey")
    }

    /// Whether this identity is the debug keystore
    pub fn is_debug(&self) -> bool {
        self.name == DEBUG_SIGNING_NAME
    }

    /// Keystore path with `~` and `$VAR` expanded
    pub fn expanded_store_file(&self) -> String {
        shellexpand::full(&self.store_file)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.store_file.clone())
    }
}

/// Release-signing policy switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SigningPolicy {
    /// Permit release variants that explicitly name the debug identity
    #[serde(default)]
    pub allow_debug_signing_for_release: bool,
}

/// Resource packaging rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagingConfig {
    /// Archive entries dropped from the package, as Gradle globs
    #[serde(default = "default_resource_excludes")]
    pub resource_excludes: Vec<String>,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            resource_excludes: default_resource_excludes(),
        }
    }
}

fn default_resource_excludes() -> Vec<String> {
    vec![
        "/META-INF/{AL2.0,LGPL2.1}",
        "META-INF/DEPENDENCIES",
        "META-INF/LICENSE",
        "META-INF/LICENSE.txt",
        "META-INF/license.txt",
        "META-INF/NOTICE",
        "META-INF/NOTICE.txt",
        "META-INF/notice.txt",
        "META-INF/ASL2.0",
        "META-INF/*.kotlin_module",
        "META-INF/*.version",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Android lint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    /// Run lint as part of release assembly
    #[serde(default)]
    pub check_release_builds: bool,

    /// Fail the build on lint errors
    #[serde(default)]
    pub abort_on_error: bool,

    /// Suppress lint warnings
    #[serde(default = "default_true")]
    pub ignore_warnings: bool,

    /// Also lint library dependencies
    #[serde(default = "default_true")]
    pub check_dependencies: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            check_release_builds: false,
            abort_on_error: false,
            ignore_warnings: true,
            check_dependencies: true,
        }
    }
}

/// Gradle dependency configuration a coordinate is declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyConfiguration {
    /// Compile and runtime classpath
    Implementation,
    /// Bill of materials pinning versions
    Platform,
    /// Kotlin annotation processor
    Kapt,
    /// Local unit tests
    TestImplementation,
    /// Instrumented tests
    AndroidTestImplementation,
    /// Desugared JDK library
    CoreLibraryDesugaring,
}

impl DependencyConfiguration {
    /// Every configuration, in Gradle declaration order
    pub const ALL: [DependencyConfiguration; 6] = [
        Self::Implementation,
        Self::Platform,
        Self::Kapt,
        Self::TestImplementation,
        Self::AndroidTestImplementation,
        Self::CoreLibraryDesugaring,
    ];

    /// Look up a configuration by its Gradle DSL name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Gradle DSL name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::Platform => "platform",
            Self::Kapt => "kapt",
            Self::TestImplementation => "testImplementation",
            Self::AndroidTestImplementation => "androidTestImplementation",
            Self::CoreLibraryDesugaring => "coreLibraryDesugaring",
        }
    }
}

/// A declared third-party dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    /// Configuration it is declared under
    pub configuration: DependencyConfiguration,

    /// `group:artifact[:version]`
    pub coordinate: String,
}

impl DependencySpec {
    fn new(configuration: DependencyConfiguration, coordinate: &str) -> Self {
        Self {
            configuration,
            coordinate: coordinate.to_string(),
        }
    }

    /// Version component, absent for BoM-managed artifacts
    pub fn version(&self) -> Option<&str> {
        let mut parts = self.coordinate.splitn(3, ':');
        parts.next()?;
        parts.next()?;
        parts.next()
    }
}

fn default_dependencies() -> Vec<DependencySpec> {
    use DependencyConfiguration::*;

    [
        (Implementation, "androidx.core:core-ktx:1.12.0"),
        (Implementation, "androidx.appcompat:appcompat:1.6.1"),
        (Implementation, "com.google.android.material:material:1.11.0"),
        (Implementation, "androidx.constraintlayout:constraintlayout:2.1.4"),
        (Implementation, "androidx.multidex:multidex:2.0.1"),
        (Implementation, "androidx.lifecycle:lifecycle-viewmodel-ktx:2.6.2"),
        (Implementation, "androidx.lifecycle:lifecycle-livedata-ktx:2.6.2"),
        (Implementation, "androidx.lifecycle:lifecycle-runtime-ktx:2.6.2"),
        (Implementation, "androidx.navigation:navigation-fragment-ktx:2.7.6"),
        (Implementation, "androidx.navigation:navigation-ui-ktx:2.7.6"),
        (Implementation, "org.jetbrains.kotlinx:kotlinx-coroutines-android:1.7.3"),
        (Implementation, "org.jetbrains.kotlinx:kotlinx-coroutines-core:1.7.3"),
        (Implementation, "com.squareup.retrofit2:retrofit:2.9.0"),
        (Implementation, "com.squareup.retrofit2:converter-gson:2.9.0"),
        (Implementation, "com.squareup.okhttp3:logging-interceptor:4.11.0"),
        (Implementation, "com.github.bumptech.glide:glide:4.16.0"),
        (Kapt, "com.github.bumptech.glide:compiler:4.16.0"),
        (Platform, "com.google.firebase:firebase-bom:32.7.0"),
        (Implementation, "com.google.firebase:firebase-analytics"),
        (Implementation, "com.google.firebase:firebase-crashlytics"),
        (Implementation, "com.google.firebase:firebase-messaging"),
        (Implementation, "androidx.work:work-runtime-ktx:2.8.1"),
        (TestImplementation, "junit:junit:4.13.2"),
        (AndroidTestImplementation, "androidx.test.ext:junit:1.1.5"),
        (AndroidTestImplementation, "androidx.test.espresso:espresso-core:3.5.1"),
        (CoreLibraryDesugaring, "com.android.tools:desugar_jdk_libs:2.0.4"),
    ]
    .into_iter()
    .map(|(configuration, coordinate)| DependencySpec::new(configuration, coordinate))
    .collect()
}
