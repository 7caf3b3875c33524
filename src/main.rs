use clap::{arg,crate_version,Command};
use megacomp::format::Format;
use megacomp::nemesis;

const RCH: &str = "unreachable was reached";

// exit codes: 0 ok, 1 usage, 2 input open failed, 3 output open failed,
// 4 invalid combination or size

fn main() {
    env_logger::init();
    std::process::exit(run());
}

fn parse_num(s: &str) -> Option<usize> {
    match s.strip_prefix("0x") {
        Some(hexits) => usize::from_str_radix(hexits,16).ok(),
        None => s.parse::<usize>().ok()
    }
}

fn run() -> i32 {
    let long_help =
"Examples:
---------
Compress:      `megacomp compress -f kosinski -i art.bin -o art.kos`
Expand:        `megacomp expand -f kosinski -i art.kos -o art.bin`
Moduled:       `megacomp compress -f kosinski -m -i art.bin -o art.kosm`
Recompress:    `megacomp crunch -f nemesis -i old.nem -o new.nem`";

    let formats = ["comper","comperx","enigma","kosinski","kosplus","lzkn1","nemesis","rocket","saxman","snkrle","artc42"];

    let mut main_cmd = Command::new("megacomp")
        .about("Compress and expand Mega Drive formats")
        .after_long_help(long_help)
        .subcommand_required(true)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-f --format <FORMAT> "compression format").value_parser(formats)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-m --moduled "wrap the output in the moduled container"))
        .arg(arg!(-p --padding <BYTES> "moduled padding, a power of two").required(false))
        .arg(arg!(-S --nosize "omit the size header (saxman only)"))
        .about("compress a file"));
    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-f --format <FORMAT> "compression format").value_parser(formats)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-m --moduled "input uses the moduled container"))
        .arg(arg!(-p --padding <BYTES> "moduled padding, a power of two").required(false))
        .arg(arg!(-x --offset <POS> "expand starting from this offset").required(false))
        .arg(arg!(-s --size <BYTES> "compressed size of a headerless stream (saxman only)").required(false))
        .arg(arg!(-n --info "print the end of the compressed data in hex (nemesis only)"))
        .about("expand a file"));
    main_cmd = main_cmd.subcommand(Command::new("crunch")
        .arg(arg!(-f --format <FORMAT> "compression format").value_parser(formats)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file and compress it again, canonicalizing it"));

    let matches = match main_cmd.try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}",e);
            return 1;
        }
    };

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let fmt = Format::from_name(cmd.get_one::<String>("format").expect(RCH)).expect(RCH);
        let moduled = cmd.get_flag("moduled");
        let no_size = cmd.get_flag("nosize");
        if no_size && fmt != Format::Saxman {
            eprintln!("--nosize only applies to saxman");
            return 4;
        }
        let padding = match cmd.get_one::<String>("padding") {
            Some(s) => match (moduled,parse_num(s)) {
                (true,Some(p)) if p > 0 && p.is_power_of_two() => p,
                _ => {
                    eprintln!("--padding requires --moduled and a power of two");
                    return 4;
                }
            },
            None => fmt.module_padding()
        };
        let dat = match std::fs::read(cmd.get_one::<String>("input").expect(RCH)) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("input could not be opened: {}",e);
                return 2;
            }
        };
        let result = match (moduled,no_size) {
            (true,_) => fmt.moduled_encode(&dat,fmt.module_size(),padding),
            (false,true) => Ok(megacomp::saxman::encode(&dat,false)),
            (false,false) => fmt.encode(&dat)
        };
        let compressed = match result {
            Ok(c) => c,
            Err(e) => {
                eprintln!("compression failed: {}",e);
                return 4;
            }
        };
        if let Err(e) = std::fs::write(cmd.get_one::<String>("output").expect(RCH),compressed) {
            eprintln!("output could not be opened: {}",e);
            return 3;
        }
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let fmt = Format::from_name(cmd.get_one::<String>("format").expect(RCH)).expect(RCH);
        let moduled = cmd.get_flag("moduled");
        let info = cmd.get_flag("info");
        if info && fmt != Format::Nemesis {
            eprintln!("--info only applies to nemesis");
            return 4;
        }
        let size = match cmd.get_one::<String>("size") {
            Some(s) => match (fmt,parse_num(s)) {
                (Format::Saxman,Some(n)) if !moduled => Some(n),
                _ => {
                    eprintln!("--size requires saxman without --moduled");
                    return 4;
                }
            },
            None => None
        };
        let padding = match cmd.get_one::<String>("padding") {
            Some(s) => match (moduled,parse_num(s)) {
                (true,Some(p)) if p > 0 && p.is_power_of_two() => p,
                _ => {
                    eprintln!("--padding requires --moduled and a power of two");
                    return 4;
                }
            },
            None => fmt.module_padding()
        };
        let dat = match std::fs::read(cmd.get_one::<String>("input").expect(RCH)) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("input could not be opened: {}",e);
                return 2;
            }
        };
        let offset = match cmd.get_one::<String>("offset") {
            Some(s) => match parse_num(s) {
                Some(n) if n <= dat.len() => n,
                _ => {
                    eprintln!("offset is not inside the input");
                    return 4;
                }
            },
            None => 0
        };
        let dat = &dat[offset..];
        let result = match (moduled,size) {
            (true,_) => fmt.moduled_decode(dat,padding),
            (false,Some(n)) => megacomp::saxman::decode_headerless(dat,n),
            (false,None) => fmt.decode(dat)
        };
        let expanded = match result {
            Ok(x) => x,
            Err(e) => {
                eprintln!("expansion failed: {}",e);
                return 4;
            }
        };
        if info {
            match nemesis::compressed_end(dat) {
                Ok(end) => println!("{:#x}",offset + end),
                Err(e) => {
                    eprintln!("expansion failed: {}",e);
                    return 4;
                }
            }
        }
        if let Err(e) = std::fs::write(cmd.get_one::<String>("output").expect(RCH),expanded) {
            eprintln!("output could not be opened: {}",e);
            return 3;
        }
    }

    if let Some(cmd) = matches.subcommand_matches("crunch") {
        let fmt = Format::from_name(cmd.get_one::<String>("format").expect(RCH)).expect(RCH);
        let dat = match std::fs::read(cmd.get_one::<String>("input").expect(RCH)) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("input could not be opened: {}",e);
                return 2;
            }
        };
        let crunched = match fmt.decode(&dat).and_then(|x| fmt.encode(&x)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("recompression failed: {}",e);
                return 4;
            }
        };
        if let Err(e) = std::fs::write(cmd.get_one::<String>("output").expect(RCH),crunched) {
            eprintln!("output could not be opened: {}",e);
            return 3;
        }
    }

    0
}
