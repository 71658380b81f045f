//! Fixed package lists, pruning tables, and build flags.

/// Essential build tools installed before the build. Any install failure
/// here aborts the run.
pub const ESSENTIAL_PACKAGES: &[&str] = &["gmake", "autoconf", "bash", "unzip", "zip"];

/// Optional runtime libraries (fonts, X11, printing, audio). Install
/// failures are logged and the run continues; a headless JRE works
/// without them.
pub const OPTIONAL_PACKAGES: &[&str] = &[
  "fontconfig",
  "freetype2",
  "libX11",
  "libXext",
  "libXi",
  "libXrandr",
  "libXrender",
  "libXt",
  "libXtst",
  "cups",
  "alsa-lib",
];

/// Commands that must exist after package installation. Missing entries
/// are fatal.
pub const REQUIRED_COMMANDS: &[&str] = &["gmake"];

/// Commands the build expects but can survive without. Missing entries
/// are warnings.
pub const RECOMMENDED_COMMANDS: &[&str] = &["which", "make"];

/// pkg repository channels, tried in order. The last entry is the
/// fallback and gets a single attempt.
pub const PKG_CHANNELS: &[&str] = &["quarterly", "latest"];

/// JDK development tools removed from `bin/` when pruning to a JRE.
/// `java`, `keytool`, and `rmiregistry` stay.
pub const JDK_ONLY_TOOLS: &[&str] = &[
  "jar",
  "jarsigner",
  "javac",
  "javadoc",
  "javap",
  "jcmd",
  "jconsole",
  "jdb",
  "jdeprscan",
  "jdeps",
  "jfr",
  "jhsdb",
  "jimage",
  "jinfo",
  "jlink",
  "jmap",
  "jmod",
  "jpackage",
  "jps",
  "jrunscript",
  "jshell",
  "jstack",
  "jstat",
  "jstatd",
  "jwebserver",
  "serialver",
];

/// Directory trees removed from the image when pruning to a JRE.
pub const JDK_ONLY_DIRS: &[&str] = &["include", "jmods", "demo", "sample"];

/// Individual files removed from the image when pruning to a JRE.
pub const JDK_ONLY_FILES: &[&str] = &["lib/src.zip"];

/// Extra C flags passed to the upstream configure step.
pub const STATIC_CFLAGS: &str = "-fPIC";

/// Extra linker flags forcing static linking of the runtime support
/// libraries.
pub const STATIC_LDFLAGS: &str = "-static-libgcc -static-libstdc++";

/// File name of the plain-text metadata file written into the image root.
pub const RELEASE_INFO_FILE: &str = "release-info";
