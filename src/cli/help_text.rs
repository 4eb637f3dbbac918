pub(super) const ROOT_LONG_ABOUT: &str = "\
Reconcile directory computer descriptions with each host's own description

descsync searches the directory for computers whose name matches a pattern,
asks every matching host for the description it stores locally, and shows
where the two disagree. Local descriptions can then be copied into the
directory, either all at once or one computer at a time.

The run is interactive. descsync asks for:

  Search term
    Part of a computer name, or a pattern using * and ? wildcards.
    Matching ignores case. An empty term aborts the run.

  Directory account / Host account
    Accounts to use for the directory and for host queries.
    Leave blank to use the current identity.

  Update mode
    1  update every pending computer
    2  confirm each computer (y/yes = update, q... = quit, anything else = skip)
    Anything else quits without changes.

HOW COMPUTERS ARE COMPARED:

  Both descriptions are trimmed of surrounding whitespace. Hosts that cannot
  be contacted are reported and left out. A computer is offered for update
  when its local description is not empty and is not already contained in
  the directory description (ignoring case).

CONFIGURATION (descsync.toml):

  dry_run = false            simulate all directory updates
  transcript = true          write descsync-YYYYMMDD-HHMMSS.log per run
  transcript_dir = \".\"

  [directory]
  file = \"directory.toml\"    directory description store

  [hosts]
  file = \"hosts.toml\"        snapshot of host descriptions, or
  command = [\"ssh\", \"{host}\", \"cat\", \"/etc/description\"]
  timeout_secs = 30          per-host limit for command queries

  Command arguments may use {host} and {user}. The command's standard output
  is the host's description; a non-zero exit or a timeout marks the host as
  unreachable.

EXIT STATUS:

  0    finished (including nothing to do, or quitting without changes)
  1    at least one update failed
  2    empty search term
  255  any other error
";
