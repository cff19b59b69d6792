//! Shared harness for black-box specifications of the build orchestration
//! service: a temp on-disk root, a fake `make` wrapper standing in for the
//! OpenWrt SDK, and a handle on a spawned `owbd` runner process.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;
use std::time::Duration;

use owb_core::{BuildId, ProfileBody};
use owb_profile::ProfileStore;
use owb_storage::BuildRegistry;

pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Poll a condition until it returns true or the timeout elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll = Duration::from_millis(SPEC_POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll);
    }
    false
}

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn owbd_binary() -> PathBuf {
    binary_path("owbd")
}

pub fn owb_binary() -> PathBuf {
    binary_path("owb")
}

/// A shell script standing in for `make`, matching the Make variable
/// contract the real wrapper Makefiles expose (`C=<cache dir>`,
/// `IMAGES=<space-separated kinds>`), sourcing `config.mk` for the
/// release/target/subtarget/platform fields used in the artifact filename.
const SUCCEEDING_MAKE: &str = "#!/bin/sh\n\
C_DIR=\"\"\n\
IMAGES=\"\"\n\
for a in \"$@\"; do\n\
  case \"$a\" in\n\
    C=*) C_DIR=\"${a#C=}\" ;;\n\
    IMAGES=*) IMAGES=\"${a#IMAGES=}\" ;;\n\
  esac\n\
done\n\
. \"$C_DIR/config.mk\"\n\
for kind in $IMAGES; do\n\
  touch \"$C_DIR/openwrt-${RELEASE}-${TARGET}-${SUBTARGET}-${PLATFORM}-squashfs-${kind}.bin\"\n\
done\n\
exit 0\n";

const SLOW_MAKE: &str = "#!/bin/sh\n\
trap 'exit 1' TERM\n\
i=0\n\
while [ $i -lt 100 ]; do\n\
  sleep 1\n\
  i=$((i + 1))\n\
done\n\
exit 0\n";

const FAILING_MAKE: &str = "#!/bin/sh\n\
echo \"Unknown package 'xyz'\" 1>&2\n\
exit 1\n";

#[derive(Clone, Copy)]
pub enum FakeMake {
    Succeeding,
    Slow,
    Failing,
}

impl FakeMake {
    fn script(self) -> &'static str {
        match self {
            FakeMake::Succeeding => SUCCEEDING_MAKE,
            FakeMake::Slow => SLOW_MAKE,
            FakeMake::Failing => FAILING_MAKE,
        }
    }
}

/// A temp on-disk root with the seven `OPENWRT_BUILDER_*` directories laid
/// out, a stub wrapper `Makefile`, and a fake `make` binary.
pub struct Harness {
    root: tempfile::TempDir,
    builds_dir: PathBuf,
    files_dir: PathBuf,
    cache_dir: PathBuf,
    wrapper_dir: PathBuf,
    profiles_dir: PathBuf,
    lists_dir: PathBuf,
    runtime_dir: PathBuf,
    make_path: PathBuf,
}

impl Harness {
    pub fn new(make: FakeMake) -> Self {
        let root = tempfile::tempdir().unwrap();
        let builds_dir = root.path().join("builds");
        let files_dir = root.path().join("files");
        let cache_dir = root.path().join("cache");
        let wrapper_dir = root.path().join("wrapper");
        let profiles_dir = root.path().join("profiles");
        let lists_dir = root.path().join("lists");
        let runtime_dir = root.path().join("runtime");
        for dir in [&builds_dir, &files_dir, &cache_dir, &wrapper_dir, &profiles_dir, &lists_dir, &runtime_dir] {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(wrapper_dir.join("Makefile"), "image:\n\ttrue\n").unwrap();

        let make_path = root.path().join("fake-make.sh");
        let mut file = std::fs::File::create(&make_path).unwrap();
        file.write_all(make.script().as_bytes()).unwrap();
        let mut perms = std::fs::metadata(&make_path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&make_path, perms).unwrap();

        Self {
            root,
            builds_dir,
            files_dir,
            cache_dir,
            wrapper_dir,
            profiles_dir,
            lists_dir,
            runtime_dir,
            make_path,
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Seed an empty-bodied profile so requests referencing it resolve.
    pub fn seed_profile(&self, profile_id: &str) {
        ProfileStore::new(&self.profiles_dir)
            .create(profile_id, ProfileBody::default(), false)
            .unwrap();
    }

    /// A `BuildRegistry` over this harness's `builds_dir`, for direct
    /// assertions and setup without shelling out to the CLI.
    pub fn registry(&self) -> BuildRegistry {
        BuildRegistry::new(&self.builds_dir, Arc::new(ProfileStore::new(&self.profiles_dir)))
    }

    fn apply_env(&self, cmd: &mut Command) {
        cmd.env("OPENWRT_BUILDER_BUILDS_DIR", &self.builds_dir);
        cmd.env("OPENWRT_BUILDER_FILES_DIR", &self.files_dir);
        cmd.env("OPENWRT_BUILDER_CACHE_DIR", &self.cache_dir);
        cmd.env("OPENWRT_BUILDER_WRAPPER_DIR", &self.wrapper_dir);
        cmd.env("OPENWRT_BUILDER_PROFILES_DIR", &self.profiles_dir);
        cmd.env("OPENWRT_BUILDER_LISTS_DIR", &self.lists_dir);
        cmd.env("OPENWRT_BUILDER_RUNTIME_DIR", &self.runtime_dir);
    }

    /// Build an `owb` command with this harness's environment applied.
    pub fn owb(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(owb_binary());
        cmd.args(args);
        self.apply_env(&mut cmd);
        cmd
    }

    /// Spawn `owbd` in the background against this harness, with the fake
    /// `make` binary wired in via the engine's own env var override.
    ///
    /// The real wrapper scripts shell out to `make`; the runner binary has
    /// no flag for substituting it, so tests point `PATH` at a directory
    /// containing a `make` shim that execs the fake script.
    pub fn spawn_runner(&self) -> RunnerProcess {
        let shim_dir = self.root.path().join("bin");
        std::fs::create_dir_all(&shim_dir).unwrap();
        let shim_path = shim_dir.join("make");
        std::fs::write(&shim_path, format!("#!/bin/sh\nexec \"{}\" \"$@\"\n", self.make_path.display())).unwrap();
        let mut perms = std::fs::metadata(&shim_path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&shim_path, perms).unwrap();

        let path_var = format!("{}:{}", shim_dir.display(), std::env::var("PATH").unwrap_or_default());

        let mut cmd = Command::new(owbd_binary());
        self.apply_env(&mut cmd);
        cmd.env("PATH", path_var);
        cmd.stdout(std::process::Stdio::null());
        cmd.stderr(std::process::Stdio::null());
        let child = cmd.spawn().expect("owbd should spawn");
        RunnerProcess { child }
    }
}

pub struct RunnerProcess {
    child: Child,
}

impl RunnerProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// SIGKILL the runner, simulating a crash mid-build.
    pub fn kill(&mut self) {
        let _ = Command::new("kill").args(["-9", &self.child.id().to_string()]).status();
        let _ = self.child.wait();
    }
}

impl Drop for RunnerProcess {
    fn drop(&mut self) {
        let _ = Command::new("kill").args(["-9", &self.child.id().to_string()]).status();
        let _ = self.child.wait();
    }
}

/// Convenience: wait until `get_build` reports one of `states` (compared
/// by `Debug` formatting, lowercased, to avoid importing `BuildState` into
/// every spec file).
pub fn wait_for_state(registry: &BuildRegistry, build_id: &BuildId, states: &[&str]) -> bool {
    wait_for(SPEC_WAIT_MAX_MS, || {
        let Ok(record) = registry.get_build(build_id) else {
            return false;
        };
        let state = format!("{:?}", record.state).to_lowercase();
        states.contains(&state.as_str())
    })
}
